//! Request types for bulk reads

use std::fmt;
use std::time::Duration;

/// USB endpoint address. Bit 7 set means IN (device to host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(u8);

impl Endpoint {
    pub const fn new(address: u8) -> Self {
        Self(address)
    }

    pub const fn address(&self) -> u8 {
        self.0
    }

    pub const fn is_in(&self) -> bool {
        (self.0 & 0x80) != 0
    }
}

impl From<u8> for Endpoint {
    fn from(address: u8) -> Self {
        Self(address)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Transfer timeout in milliseconds, as handed to libusb.
///
/// Zero means the transport waits indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timeout(u32);

impl Timeout {
    pub const INFINITE: Timeout = Timeout(0);

    /// Build a timeout from a signed millisecond count.
    ///
    /// Zero and negative values select [`Timeout::INFINITE`]; values above
    /// `u32::MAX` saturate.
    pub fn from_millis(ms: i64) -> Self {
        if ms <= 0 {
            Self::INFINITE
        } else {
            Self(u32::try_from(ms).unwrap_or(u32::MAX))
        }
    }

    pub const fn as_millis(&self) -> u32 {
        self.0
    }

    pub const fn is_infinite(&self) -> bool {
        self.0 == 0
    }
}

impl From<Duration> for Timeout {
    /// A zero duration waits indefinitely. Any other duration rounds up to the
    /// next whole millisecond so it never turns into an infinite wait.
    fn from(duration: Duration) -> Self {
        if duration.is_zero() {
            return Self::INFINITE;
        }
        let ms = duration.as_nanos().div_ceil(1_000_000);
        Self(u32::try_from(ms).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            f.write_str("infinite")
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}

/// A single bulk IN read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub endpoint: Endpoint,
    /// Maximum number of bytes to receive
    pub length: usize,
    pub timeout: Timeout,
}

impl TransferRequest {
    pub fn new(endpoint: u8, length: usize, timeout: Timeout) -> Self {
        Self {
            endpoint: Endpoint::new(endpoint),
            length,
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_direction() {
        assert!(Endpoint::new(0x81).is_in());
        assert!(!Endpoint::new(0x02).is_in());
        assert_eq!(Endpoint::from(0x81).to_string(), "0x81");
    }

    #[test]
    fn test_timeout_from_millis() {
        assert_eq!(Timeout::from_millis(1000).as_millis(), 1000);
        assert_eq!(Timeout::from_millis(0), Timeout::INFINITE);
        assert_eq!(Timeout::from_millis(-1), Timeout::INFINITE);
        assert_eq!(Timeout::from_millis(i64::MAX).as_millis(), u32::MAX);
    }

    #[test]
    fn test_sub_millisecond_duration_is_finite() {
        let timeout = Timeout::from(Duration::from_micros(500));
        assert!(!timeout.is_infinite());
        assert_eq!(timeout.as_millis(), 1);
        assert_eq!(Timeout::from(Duration::from_nanos(1)).as_millis(), 1);
    }

    #[test]
    fn test_timeout_from_duration() {
        assert_eq!(Timeout::from(Duration::from_millis(250)).as_millis(), 250);
        assert_eq!(Timeout::from(Duration::from_secs(0)), Timeout::INFINITE);
        assert_eq!(Timeout::from(Duration::from_micros(1500)).as_millis(), 2);
        assert_eq!(Timeout::from(Duration::from_secs(u64::MAX)).as_millis(), u32::MAX);
        assert_eq!(Timeout::from_millis(100).to_string(), "100ms");
        assert_eq!(Timeout::INFINITE.to_string(), "infinite");
    }
}
