//! Bulk read bridge tests
//!
//! Exercises the read path against a scripted transport:
//! - Full, short, and empty reads
//! - Timeout with partial data
//! - Transport failure classification
//! - Allocation failure
//!
//! Payloads are only checked for length and classification, never compared
//! across calls.
//!
//! Run with: `cargo test -p usb-reader --test bridge_tests`

use proptest::prelude::*;
use usb_reader::test_utils::MockTransport;
use usb_reader::{Endpoint, ReadError, Timeout, TransferRequest, TransportError, read};

const AUDIO_IN: u8 = 0x81;

fn request(length: usize) -> TransferRequest {
    TransferRequest::new(AUDIO_IN, length, Timeout::from_millis(1000))
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_full_read_succeeds() {
    let transport = MockTransport::filling(64);

    let payload = read(&transport, request(64)).expect("read should succeed");

    assert_eq!(payload.len(), 64);
    assert_eq!(transport.calls(), 1);
}

#[test]
fn test_timeout_returns_partial_payload() {
    let transport = MockTransport::filling(10).timing_out();

    let payload = read(&transport, request(64)).expect("timeout is not an error");

    assert_eq!(payload.len(), 10);
}

#[test]
fn test_timeout_without_data_returns_empty_payload() {
    let transport = MockTransport::failing(TransportError::Timeout);

    let payload = read(&transport, request(64)).expect("timeout is not an error");

    assert!(payload.is_empty());
}

#[test]
fn test_pipe_error_is_reported() {
    let transport = MockTransport::failing(TransportError::Pipe);

    let err = read(&transport, request(64)).unwrap_err();

    assert!(matches!(err, ReadError::Transfer(TransportError::Pipe)));
    assert_eq!(err.transport_name(), Some("LIBUSB_ERROR_PIPE"));
}

#[test]
fn test_failure_discards_partial_data() {
    // Bytes written before a non-timeout failure are never surfaced
    let transport = MockTransport::filling(32).with_status(Err(TransportError::Io));

    let err = read(&transport, request(64)).unwrap_err();

    assert_eq!(err.transport_name(), Some("LIBUSB_ERROR_IO"));
}

#[test]
fn test_transient_errors_are_not_retried() {
    for error in [TransportError::Busy, TransportError::Interrupted] {
        let transport = MockTransport::failing(error);

        let err = read(&transport, request(64)).unwrap_err();

        assert!(matches!(err, ReadError::Transfer(e) if e == error));
        assert_eq!(transport.calls(), 1);
    }
}

#[test]
fn test_short_read_succeeds() {
    let transport = MockTransport::filling(2880);

    let payload = read(&transport, request(3120)).unwrap();

    assert_eq!(payload.len(), 2880);
}

#[test]
fn test_zero_length_read() {
    let transport = MockTransport::filling(64);

    let payload = read(&transport, request(0)).unwrap();

    assert!(payload.is_empty());
    let observed = transport.last_transfer().expect("transfer issued");
    assert_eq!(observed.buffer_len, 0);
}

#[test]
fn test_request_forwarded_to_transport() {
    let transport = MockTransport::filling(8);

    read(&transport, TransferRequest::new(0x83, 512, Timeout::from_millis(250))).unwrap();

    let observed = transport.last_transfer().expect("transfer issued");
    assert_eq!(observed.endpoint, Endpoint::new(0x83));
    assert_eq!(observed.buffer_len, 512);
    assert_eq!(observed.timeout.as_millis(), 250);
}

#[test]
fn test_non_positive_timeout_waits_indefinitely() {
    let transport = MockTransport::filling(8);

    read(&transport, TransferRequest::new(AUDIO_IN, 8, Timeout::from_millis(-5))).unwrap();

    assert!(transport.last_transfer().unwrap().timeout.is_infinite());
}

#[test]
fn test_allocation_failure_skips_transfer() {
    let transport = MockTransport::filling(64);

    let err = read(&transport, request(usize::MAX)).unwrap_err();

    assert!(matches!(err, ReadError::OutOfMemory { .. }));
    assert_eq!(transport.calls(), 0);
}

// ============================================================================
// Properties
// ============================================================================

fn status_strategy() -> impl Strategy<Value = Result<(), TransportError>> {
    prop_oneof![
        Just(Ok(())),
        Just(Err(TransportError::Timeout)),
        (-12i32..=-1).prop_map(|code| Err(TransportError::from_code(code))),
        Just(Err(TransportError::Other)),
    ]
}

proptest! {
    /// Property: a payload never exceeds the requested length
    #[test]
    fn prop_payload_within_requested_length(
        length in 0usize..=4096,
        fill in 0usize..=8192,
        reported in proptest::option::of(0usize..=16384),
    ) {
        let mut transport = MockTransport::filling(fill);
        if let Some(count) = reported {
            transport = transport.reporting(count);
        }

        let payload = read(&transport, request(length)).unwrap();

        prop_assert!(payload.len() <= length);
        prop_assert_eq!(transport.calls(), 1);
    }

    /// Property: only success and timeout produce a payload
    #[test]
    fn prop_classification(
        length in 0usize..=1024,
        fill in 0usize..=1024,
        status in status_strategy(),
    ) {
        let transport = MockTransport::filling(fill).with_status(status);

        let result = read(&transport, request(length));

        match status {
            Ok(()) | Err(TransportError::Timeout) => {
                let payload = result.unwrap();
                prop_assert_eq!(payload.len(), fill.min(length));
            }
            Err(error) => {
                let err = result.unwrap_err();
                prop_assert_eq!(err.transport_name(), Some(error.name()));
            }
        }
        prop_assert_eq!(transport.calls(), 1);
    }
}
