//! Common utilities for usb-reader tools
//!
//! Shared error handling and logging setup for the binaries built on top of
//! the reader library.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::setup_logging;
