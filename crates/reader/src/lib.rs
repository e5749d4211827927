//! usb-reader
//!
//! Synchronous USB bulk IN reads against an already-open libusb device handle,
//! returning the received bytes as a plain buffer.
//!
//! One call issues exactly one bulk transfer. A timeout with partial (or no)
//! data is reported as a short payload, every other transport failure as a
//! [`ReadError::Transfer`] carrying libusb's symbolic error name.

pub mod bridge;
pub mod error;
pub mod test_utils;
pub mod transport;
pub mod types;

pub use bridge::{read, read_fast};
pub use error::{ReadError, Result, TransportError};
pub use transport::{BulkTransport, Completion};
pub use types::{Endpoint, Timeout, TransferRequest};
