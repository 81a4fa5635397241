//! xHCI host controller handle

use crate::pci::config::read_vendor_id;
use crate::pci::database::VENDOR_INTEL;
use crate::pci::{ConfigSpace, Device, DeviceRegistry};

/// Class code of an xHCI controller (base, sub, interface)
pub const XHCI_CLASS: (u8, u8, u8) = (0x0C, 0x03, 0x30);

/// An xHC whose register block has been located
#[derive(Debug)]
pub struct Controller {
    mmio_base: u64,
}

impl Controller {
    pub const fn new(mmio_base: u64) -> Self {
        Self { mmio_base }
    }

    /// Physical address of the capability registers
    pub const fn mmio_base(&self) -> u64 {
        self.mmio_base
    }
}

pub fn is_xhc(device: &Device) -> bool {
    device.class_code.matches(XHCI_CLASS.0, XHCI_CLASS.1, XHCI_CLASS.2)
}

/// Pick the xHC to drive.
///
/// Boards with an Intel chipset often also carry a third-party xHC; the
/// Intel one owns the ports routed from the chipset, so it wins when
/// `prefer_intel` is set. Otherwise the first xHC in scan order is used.
pub fn find_controller<C, const N: usize>(config: &mut C, registry: &DeviceRegistry<N>, prefer_intel: bool) -> Option<Device>
where
    C: ConfigSpace + ?Sized,
{
    if prefer_intel {
        let intel = registry
            .iter()
            .filter(|device| is_xhc(device))
            .find(|device| read_vendor_id(&mut *config, device.bus, device.device, device.function) == VENDOR_INTEL);
        if intel.is_some() {
            return intel.copied();
        }
    }
    registry.find(is_xhc)
}
