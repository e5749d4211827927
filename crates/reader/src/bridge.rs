//! Bulk read bridge
//!
//! Allocates the receive buffer, issues exactly one bulk transfer, and turns
//! the transport's completion into a payload or a [`ReadError`]. A timeout is
//! not an error: whatever arrived before it elapsed is returned, possibly
//! nothing.

use rusb::{DeviceHandle, UsbContext};
use tracing::{debug, warn};

use crate::error::{ReadError, Result, TransportError};
use crate::transport::BulkTransport;
use crate::types::{Timeout, TransferRequest};

/// Perform one bulk IN read and return the bytes actually received.
///
/// The payload is never longer than `request.length`. Callers must check its
/// length: a short or empty payload usually means the transfer timed out.
pub fn read<T: BulkTransport + ?Sized>(transport: &T, request: TransferRequest) -> Result<Vec<u8>> {
    let TransferRequest {
        endpoint,
        length,
        timeout,
    } = request;

    if !endpoint.is_in() {
        warn!("Bulk read on OUT endpoint {}", endpoint);
    }

    if length > transport.max_transfer_len() {
        warn!(
            "Bulk read of {} bytes exceeds the transport limit of {}",
            length,
            transport.max_transfer_len()
        );
        return Err(ReadError::Transfer(TransportError::InvalidParam));
    }

    let mut buffer = allocate(length)?;

    debug!(
        "Bulk read: endpoint={}, length={}, timeout={}",
        endpoint, length, timeout
    );

    let completion = transport.bulk_transfer(endpoint, &mut buffer, timeout);

    let transferred = if completion.transferred > length {
        warn!(
            "Transport reported {} bytes for a {} byte buffer on endpoint {}",
            completion.transferred, length, endpoint
        );
        length
    } else {
        completion.transferred
    };

    match completion.status {
        Ok(()) => {
            debug!("Bulk read succeeded: {} bytes", transferred);
        }
        Err(TransportError::Timeout) => {
            debug!(
                "Bulk read timed out on endpoint {} after {} bytes",
                endpoint, transferred
            );
        }
        Err(error) => {
            warn!("Bulk read failed on endpoint {}: {}", endpoint, error);
            return Err(ReadError::Transfer(error));
        }
    }

    buffer.truncate(transferred);
    Ok(buffer)
}

/// [`read`] against an open libusb handle, taking its arguments the way a
/// foreign caller passes them.
///
/// `timeout_ms <= 0` waits indefinitely.
pub fn read_fast<C: UsbContext>(
    handle: &DeviceHandle<C>,
    endpoint: u8,
    length: usize,
    timeout_ms: i64,
) -> Result<Vec<u8>> {
    read(
        handle,
        TransferRequest::new(endpoint, length, Timeout::from_millis(timeout_ms)),
    )
}

fn allocate(length: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(length)
        .map_err(|_| ReadError::OutOfMemory { requested: length })?;
    buffer.resize(length, 0);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockTransport;

    fn request(length: usize) -> TransferRequest {
        TransferRequest::new(0x81, length, Timeout::from_millis(1000))
    }

    #[test]
    fn test_allocate_exact_length() {
        let buffer = allocate(64).unwrap();
        assert_eq!(buffer.len(), 64);
        assert!(allocate(0).unwrap().is_empty());
    }

    #[test]
    fn test_allocate_failure() {
        assert!(matches!(
            allocate(usize::MAX),
            Err(ReadError::OutOfMemory { requested: usize::MAX })
        ));
    }

    #[test]
    fn test_overreported_count_is_clamped() {
        let transport = MockTransport::filling(16).reporting(1024);
        let payload = read(&transport, request(16)).unwrap();
        assert_eq!(payload.len(), 16);
    }

    #[test]
    fn test_oversized_length_rejected_before_allocation() {
        let transport = MockTransport::filling(64).with_max_len(1024);
        let err = read(&transport, request(1025)).unwrap_err();
        assert_eq!(err.transport_name(), Some("LIBUSB_ERROR_INVALID_PARAM"));
        assert_eq!(transport.calls(), 0);

        assert_eq!(read(&transport, request(1024)).unwrap().len(), 64);
    }

    #[test]
    fn test_out_endpoint_passed_through() {
        let transport = MockTransport::failing(TransportError::InvalidParam);
        let err = read(&transport, TransferRequest::new(0x02, 8, Timeout::INFINITE)).unwrap_err();
        assert_eq!(err.transport_name(), Some("LIBUSB_ERROR_INVALID_PARAM"));
        assert_eq!(transport.calls(), 1);
    }
}
