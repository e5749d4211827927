//! Device preparation
//!
//! Opens the capture device, detaches the kernel driver from the target
//! interface, claims it, and selects the alternate setting carrying the bulk
//! IN endpoint. Whatever was done to the interface is undone when
//! [`ClaimedDevice`] drops, including after a failed claim.

use common::{Error, Result};
use rusb::{Context, DeviceHandle, UsbContext};
use tracing::{debug, info, warn};

use crate::config::DeviceSettings;

/// Interface operations needed to hand an interface back to the system
trait InterfaceControl {
    fn release_interface(&self, interface: u8) -> rusb::Result<()>;
    fn attach_kernel_driver(&self, interface: u8) -> rusb::Result<()>;
}

impl<T: UsbContext> InterfaceControl for DeviceHandle<T> {
    fn release_interface(&self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::release_interface(self, interface)
    }

    fn attach_kernel_driver(&self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::attach_kernel_driver(self, interface)
    }
}

/// What has been done to the interface so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ClaimState {
    claimed: bool,
    /// A kernel driver was detached and should be reattached
    detached: bool,
}

/// Release the interface if claimed and reattach a detached kernel driver
fn restore<H: InterfaceControl>(handle: &H, interface: u8, state: ClaimState) {
    if state.claimed {
        if let Err(e) = handle.release_interface(interface) {
            warn!("Failed to release interface {}: {}", interface, e);
        }
    }

    if state.detached {
        if let Err(e) = handle.attach_kernel_driver(interface) {
            debug!(
                "Could not reattach kernel driver to interface {}: {}",
                interface, e
            );
        } else {
            debug!("Reattached kernel driver to interface {}", interface);
        }
    }
}

/// An open device with one claimed interface
pub struct ClaimedDevice {
    handle: DeviceHandle<Context>,
    interface: u8,
    state: ClaimState,
}

impl ClaimedDevice {
    /// Open the device with the given ids and claim the configured interface
    pub fn open(vendor_id: u16, product_id: u16, settings: &DeviceSettings) -> Result<Self> {
        let context = Context::new()?;

        let handle = context
            .open_device_with_vid_pid(vendor_id, product_id)
            .ok_or(Error::DeviceNotFound {
                vendor_id,
                product_id,
            })?;

        debug!("Opened device {:04x}:{:04x}", vendor_id, product_id);

        // Built before touching the interface so Drop undoes every step below
        let mut device = Self {
            handle,
            interface: settings.interface,
            state: ClaimState::default(),
        };
        let interface = device.interface;

        if settings.detach_kernel_driver {
            match device.handle.kernel_driver_active(interface) {
                Ok(true) => {
                    debug!("Detaching kernel driver from interface {}", interface);
                    match device.handle.detach_kernel_driver(interface) {
                        Ok(()) => device.state.detached = true,
                        Err(e) => warn!(
                            "Failed to detach kernel driver from interface {}: {}",
                            interface, e
                        ),
                    }
                }
                Ok(false) => {
                    debug!("No kernel driver active on interface {}", interface);
                }
                Err(e) => {
                    debug!(
                        "Could not check kernel driver status for interface {}: {}",
                        interface, e
                    );
                }
            }
        }

        device.handle.claim_interface(interface).inspect_err(|e| {
            warn!("Failed to claim interface {}: {}", interface, e);
        })?;
        device.state.claimed = true;

        device
            .handle
            .set_alternate_setting(interface, settings.alt_setting)
            .inspect_err(|e| {
                warn!(
                    "Failed to select alternate setting {} on interface {}: {}",
                    settings.alt_setting, interface, e
                );
            })?;

        info!(
            "Claimed interface {} (alt setting {}) on {:04x}:{:04x}",
            interface, settings.alt_setting, vendor_id, product_id
        );

        Ok(device)
    }

    pub fn handle(&self) -> &DeviceHandle<Context> {
        &self.handle
    }
}

impl Drop for ClaimedDevice {
    fn drop(&mut self) {
        restore(&self.handle, self.interface, self.state);
    }
}
