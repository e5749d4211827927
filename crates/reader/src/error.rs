//! Reader error types

use std::fmt;

use rusb::constants::*;
use thiserror::Error;

/// Failure reported by the bulk-transfer transport, in libusb's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    Io,
    InvalidParam,
    Access,
    NoDevice,
    NotFound,
    Busy,
    Timeout,
    Overflow,
    Pipe,
    Interrupted,
    NoMem,
    NotSupported,
    Other,
    /// A negative status libusb does not define
    Unknown(i32),
}

impl TransportError {
    /// Map a raw libusb status code to an error.
    ///
    /// Only meaningful for negative codes; use [`TransportError::check`] when the
    /// status may also signal success.
    pub fn from_code(code: i32) -> Self {
        match code {
            LIBUSB_ERROR_IO => Self::Io,
            LIBUSB_ERROR_INVALID_PARAM => Self::InvalidParam,
            LIBUSB_ERROR_ACCESS => Self::Access,
            LIBUSB_ERROR_NO_DEVICE => Self::NoDevice,
            LIBUSB_ERROR_NOT_FOUND => Self::NotFound,
            LIBUSB_ERROR_BUSY => Self::Busy,
            LIBUSB_ERROR_TIMEOUT => Self::Timeout,
            LIBUSB_ERROR_OVERFLOW => Self::Overflow,
            LIBUSB_ERROR_PIPE => Self::Pipe,
            LIBUSB_ERROR_INTERRUPTED => Self::Interrupted,
            LIBUSB_ERROR_NO_MEM => Self::NoMem,
            LIBUSB_ERROR_NOT_SUPPORTED => Self::NotSupported,
            LIBUSB_ERROR_OTHER => Self::Other,
            other => Self::Unknown(other),
        }
    }

    /// Interpret a libusb return status: zero or positive is success
    pub fn check(status: i32) -> std::result::Result<(), Self> {
        if status < 0 {
            Err(Self::from_code(status))
        } else {
            Ok(())
        }
    }

    /// The raw libusb status code
    pub fn code(&self) -> i32 {
        match self {
            Self::Io => LIBUSB_ERROR_IO,
            Self::InvalidParam => LIBUSB_ERROR_INVALID_PARAM,
            Self::Access => LIBUSB_ERROR_ACCESS,
            Self::NoDevice => LIBUSB_ERROR_NO_DEVICE,
            Self::NotFound => LIBUSB_ERROR_NOT_FOUND,
            Self::Busy => LIBUSB_ERROR_BUSY,
            Self::Timeout => LIBUSB_ERROR_TIMEOUT,
            Self::Overflow => LIBUSB_ERROR_OVERFLOW,
            Self::Pipe => LIBUSB_ERROR_PIPE,
            Self::Interrupted => LIBUSB_ERROR_INTERRUPTED,
            Self::NoMem => LIBUSB_ERROR_NO_MEM,
            Self::NotSupported => LIBUSB_ERROR_NOT_SUPPORTED,
            Self::Other => LIBUSB_ERROR_OTHER,
            Self::Unknown(code) => *code,
        }
    }

    /// Symbolic name, identical to what `libusb_error_name` returns
    pub fn name(&self) -> &'static str {
        match self {
            Self::Io => "LIBUSB_ERROR_IO",
            Self::InvalidParam => "LIBUSB_ERROR_INVALID_PARAM",
            Self::Access => "LIBUSB_ERROR_ACCESS",
            Self::NoDevice => "LIBUSB_ERROR_NO_DEVICE",
            Self::NotFound => "LIBUSB_ERROR_NOT_FOUND",
            Self::Busy => "LIBUSB_ERROR_BUSY",
            Self::Timeout => "LIBUSB_ERROR_TIMEOUT",
            Self::Overflow => "LIBUSB_ERROR_OVERFLOW",
            Self::Pipe => "LIBUSB_ERROR_PIPE",
            Self::Interrupted => "LIBUSB_ERROR_INTERRUPTED",
            Self::NoMem => "LIBUSB_ERROR_NO_MEM",
            Self::NotSupported => "LIBUSB_ERROR_NOT_SUPPORTED",
            Self::Other => "LIBUSB_ERROR_OTHER",
            Self::Unknown(_) => "**UNKNOWN**",
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::error::Error for TransportError {}

impl From<rusb::Error> for TransportError {
    fn from(err: rusb::Error) -> Self {
        match err {
            rusb::Error::Io => Self::Io,
            rusb::Error::InvalidParam => Self::InvalidParam,
            rusb::Error::Access => Self::Access,
            rusb::Error::NoDevice => Self::NoDevice,
            rusb::Error::NotFound => Self::NotFound,
            rusb::Error::Busy => Self::Busy,
            rusb::Error::Timeout => Self::Timeout,
            rusb::Error::Overflow => Self::Overflow,
            rusb::Error::Pipe => Self::Pipe,
            rusb::Error::Interrupted => Self::Interrupted,
            rusb::Error::NoMem => Self::NoMem,
            rusb::Error::NotSupported => Self::NotSupported,
            _ => Self::Other,
        }
    }
}

/// Errors returned by a bulk read
#[derive(Debug, Error)]
pub enum ReadError {
    /// The receive buffer could not be allocated; no transfer was issued
    #[error("Failed to allocate {requested} byte receive buffer")]
    OutOfMemory { requested: usize },

    /// The transport reported a failure other than a timeout
    #[error("USB read error: {0}")]
    Transfer(#[from] TransportError),
}

impl ReadError {
    /// Symbolic transport error name, if the failure came from the transport
    pub fn transport_name(&self) -> Option<&'static str> {
        match self {
            Self::OutOfMemory { .. } => None,
            Self::Transfer(err) => Some(err.name()),
        }
    }
}

/// Type alias for reader results
pub type Result<T> = std::result::Result<T, ReadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in [-1, -2, -3, -4, -5, -6, -7, -8, -9, -10, -11, -12, -99] {
            assert_eq!(TransportError::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_unknown_code() {
        let err = TransportError::from_code(-42);
        assert_eq!(err, TransportError::Unknown(-42));
        assert_eq!(err.name(), "**UNKNOWN**");
        assert_eq!(err.code(), -42);
    }

    #[test]
    fn test_check() {
        assert_eq!(TransportError::check(0), Ok(()));
        assert_eq!(TransportError::check(-7), Err(TransportError::Timeout));
        assert_eq!(TransportError::check(-9), Err(TransportError::Pipe));
    }

    #[test]
    fn test_from_rusb_error() {
        assert_eq!(TransportError::from(rusb::Error::Pipe), TransportError::Pipe);
        assert_eq!(TransportError::from(rusb::Error::Timeout), TransportError::Timeout);
        assert_eq!(TransportError::from(rusb::Error::NoDevice), TransportError::NoDevice);
        assert_eq!(TransportError::from(rusb::Error::BadDescriptor), TransportError::Other);
    }

    #[test]
    fn test_error_display() {
        let err = ReadError::Transfer(TransportError::Pipe);
        assert_eq!(err.to_string(), "USB read error: LIBUSB_ERROR_PIPE");
        assert_eq!(err.transport_name(), Some("LIBUSB_ERROR_PIPE"));

        let err = ReadError::OutOfMemory { requested: 4096 };
        assert!(err.to_string().contains("4096"));
        assert_eq!(err.transport_name(), None);
    }
}
