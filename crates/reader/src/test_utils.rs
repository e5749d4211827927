//! Test utilities for usb-reader
//!
//! Provides a scripted [`BulkTransport`] so the reader can be exercised
//! without hardware.
//!
//! # Example
//!
//! ```
//! use usb_reader::test_utils::MockTransport;
//! use usb_reader::{TransferRequest, Timeout, read};
//!
//! let transport = MockTransport::filling(10).timing_out();
//! let payload = read(&transport, TransferRequest::new(0x81, 64, Timeout::from_millis(1000))).unwrap();
//! assert_eq!(payload.len(), 10);
//! assert_eq!(transport.calls(), 1);
//! ```

use std::cell::Cell;

use crate::error::TransportError;
use crate::transport::{BulkTransport, Completion};
use crate::types::{Endpoint, Timeout};

/// What the mock saw on its most recent transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedTransfer {
    pub endpoint: Endpoint,
    pub buffer_len: usize,
    pub timeout: Timeout,
}

/// Transport that writes a fixed number of bytes and reports a fixed status
#[derive(Debug)]
pub struct MockTransport {
    fill: usize,
    status: Result<(), TransportError>,
    reported: Option<usize>,
    max_len: usize,
    calls: Cell<usize>,
    last: Cell<Option<ObservedTransfer>>,
}

impl MockTransport {
    /// Write up to `fill` bytes and report success
    pub fn filling(fill: usize) -> Self {
        Self {
            fill,
            status: Ok(()),
            reported: None,
            max_len: usize::MAX,
            calls: Cell::new(0),
            last: Cell::new(None),
        }
    }

    /// Write nothing and report `error`
    pub fn failing(error: TransportError) -> Self {
        Self::filling(0).with_status(Err(error))
    }

    /// Report `LIBUSB_ERROR_TIMEOUT` after filling
    pub fn timing_out(self) -> Self {
        self.with_status(Err(TransportError::Timeout))
    }

    pub fn with_status(mut self, status: Result<(), TransportError>) -> Self {
        self.status = status;
        self
    }

    /// Report `count` transferred bytes regardless of what was written
    pub fn reporting(mut self, count: usize) -> Self {
        self.reported = Some(count);
        self
    }

    /// Reject requests longer than `max_len`
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Number of transfers issued so far
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_transfer(&self) -> Option<ObservedTransfer> {
        self.last.get()
    }
}

impl BulkTransport for MockTransport {
    fn bulk_transfer(&self, endpoint: Endpoint, buf: &mut [u8], timeout: Timeout) -> Completion {
        self.calls.set(self.calls.get() + 1);
        self.last.set(Some(ObservedTransfer {
            endpoint,
            buffer_len: buf.len(),
            timeout,
        }));

        let written = self.fill.min(buf.len());
        for (i, byte) in buf[..written].iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }

        Completion {
            status: self.status,
            transferred: self.reported.unwrap_or(written),
        }
    }

    fn max_transfer_len(&self) -> usize {
        self.max_len
    }
}
