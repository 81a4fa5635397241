//! Boot-time device discovery sequence
//!
//! Scan the PCI buses, report what was found, then locate the xHC and
//! resolve its register block for the USB driver.

use log::{info, warn};

use crate::config::BootConfig;
use crate::error::{Error, Result, WithError};
use crate::pci::config::{enable_memory_and_bus_master, read_vendor_id};
use crate::pci::database::{class_name, vendor_name};
use crate::pci::{read_bar, scan_all_bus, ConfigSpace, DeviceRegistry};
use crate::usb::xhci::{find_controller, Controller};

/// Run a full bus scan and log every registered function.
///
/// The device list is reported even when the scan stops early, so a
/// `Full` registry still shows the first entries.
pub fn init_pci<C, const N: usize>(config: &mut C, registry: &mut DeviceRegistry<N>, boot_config: &BootConfig) -> Result<()>
where
    C: ConfigSpace + ?Sized,
{
    let scan: WithError<()> = scan_all_bus(config, registry, boot_config).into();
    info!("ScanAllBus: {}, device_num={}", scan.error, registry.count());

    for device in registry.iter() {
        let vendor_id = read_vendor_id(config, device.bus, device.device, device.function);
        info!(
            "{}.{}.{}: vend {:04x}, class {}, head {:02x} [{} {}]",
            device.bus,
            device.device,
            device.function,
            vendor_id,
            device.class_code,
            device.header_type,
            vendor_name(vendor_id),
            class_name(device.class_code.base, device.class_code.sub),
        );
    }

    scan.into_result()
}

/// Find the xHC in `registry` and resolve BAR0 to its MMIO base
pub fn locate_xhc<C, const N: usize>(config: &mut C, registry: &DeviceRegistry<N>, boot_config: &BootConfig) -> Result<Controller>
where
    C: ConfigSpace + ?Sized,
{
    let device = match find_controller(config, registry, boot_config.prefer_intel_xhc) {
        Some(device) => device,
        None => {
            warn!("no xHC among {} devices", registry.count());
            return Err(Error::NoSuchDevice);
        }
    };
    info!("xHC found at {}", device);

    let bar: WithError<u64> = read_bar(config, &device, 0).into();
    info!("ReadBar: {}", bar.error);
    let mmio_base = bar.into_result()?;

    if boot_config.enable_xhc_bus_master {
        let command = enable_memory_and_bus_master(config, &device);
        info!("xHC command register {:?}", command);
    }

    info!("xHC mmio_base = {:#018x}", mmio_base);
    Ok(Controller::new(mmio_base))
}

/// Discovery pass from an empty registry to a controller handle.
///
/// A scan that fills the registry is logged and the handoff is still
/// attempted with the devices that fit.
pub fn run<C, const N: usize>(config: &mut C, registry: &mut DeviceRegistry<N>, boot_config: &BootConfig) -> Result<Controller>
where
    C: ConfigSpace + ?Sized,
{
    if let Err(error) = init_pci(config, registry, boot_config) {
        warn!("PCI scan stopped early: {}", error);
    }
    locate_xhc(config, registry, boot_config)
}
