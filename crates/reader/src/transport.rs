//! Bulk-transfer transport
//!
//! [`BulkTransport`] is the seam between the reader and the blocking
//! bulk-transfer primitive. The libusb implementation calls
//! `libusb_bulk_transfer` directly instead of going through
//! `DeviceHandle::read_bulk`, because rusb discards the transferred byte
//! count when the transfer times out.

use std::ffi::c_int;

use rusb::{DeviceHandle, UsbContext, ffi};

use crate::error::TransportError;
use crate::types::{Endpoint, Timeout};

/// Result of one blocking bulk transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub status: Result<(), TransportError>,
    /// Bytes written into the buffer, valid for every status
    pub transferred: usize,
}

impl Completion {
    pub fn failed(error: TransportError, transferred: usize) -> Self {
        Self {
            status: Err(error),
            transferred,
        }
    }
}

/// A blocking bulk-transfer primitive
pub trait BulkTransport {
    /// Issue exactly one bulk transfer on `endpoint` into `buf`.
    fn bulk_transfer(&self, endpoint: Endpoint, buf: &mut [u8], timeout: Timeout) -> Completion;

    /// Largest buffer a single transfer accepts
    fn max_transfer_len(&self) -> usize {
        usize::MAX
    }
}

impl<C: UsbContext> BulkTransport for DeviceHandle<C> {
    fn bulk_transfer(&self, endpoint: Endpoint, buf: &mut [u8], timeout: Timeout) -> Completion {
        let Ok(length) = c_int::try_from(buf.len()) else {
            return Completion::failed(TransportError::InvalidParam, 0);
        };
        let mut transferred: c_int = 0;

        // SAFETY: the handle is open for as long as `self` is borrowed, `buf` is
        // valid for writes of `length` bytes, and libusb does not keep either
        // pointer after the synchronous call returns.
        let status = unsafe {
            ffi::libusb_bulk_transfer(
                self.as_raw(),
                endpoint.address(),
                buf.as_mut_ptr(),
                length,
                &mut transferred,
                timeout.as_millis(),
            )
        };

        Completion {
            status: TransportError::check(status),
            transferred: usize::try_from(transferred).unwrap_or(0),
        }
    }

    /// libusb takes the buffer length as a C `int`
    fn max_transfer_len(&self) -> usize {
        usize::try_from(c_int::MAX).unwrap_or(usize::MAX)
    }
}
