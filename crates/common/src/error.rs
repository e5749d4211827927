//! Common error types

use thiserror::Error;
use usb_reader::TransportError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("USB error: {0}")]
    Usb(#[from] TransportError),

    #[error("Device {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusb::Error> for Error {
    fn from(err: rusb::Error) -> Self {
        Self::Usb(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usb_error_keeps_symbolic_name() {
        let err = Error::from(rusb::Error::Access);
        assert_eq!(err.to_string(), "USB error: LIBUSB_ERROR_ACCESS");
    }

    #[test]
    fn test_device_not_found_display() {
        let err = Error::DeviceNotFound {
            vendor_id: 0x0582,
            product_id: 0x000c,
        };
        assert_eq!(err.to_string(), "Device 0582:000c not found");
    }
}
