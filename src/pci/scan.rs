//! PCI bus scanner
//!
//! Depth-first walk over bus/device/function space. Every function found is
//! appended to a [`DeviceRegistry`]; PCI-to-PCI bridges are followed into
//! their secondary bus before the scan moves on to the next sibling.

use log::{debug, warn};

use super::config::{read_bus_numbers, read_class_code, read_header_type, read_vendor_id};
use super::{
    is_single_function_device, ConfigSpace, Device, DeviceRegistry, DEVICE_CAPACITY, INVALID_VENDOR_ID, MAX_DEVICE,
    MAX_FUNCTION, PCI_TO_PCI_BRIDGE,
};
use crate::config::BootConfig;
use crate::error::{Error, Result};

/// PCI bus scanner
pub struct PciBusScanner<'a, C, const N: usize = DEVICE_CAPACITY> {
    config: C,
    registry: &'a mut DeviceRegistry<N>,
    max_depth: u8,
    /// One bit per bus already walked in this pass
    scanned: [u32; 8],
}

impl<'a, C: ConfigSpace, const N: usize> PciBusScanner<'a, C, N> {
    pub fn new(config: C, registry: &'a mut DeviceRegistry<N>) -> Self {
        Self {
            config,
            registry,
            max_depth: BootConfig::DEFAULT.max_bridge_depth,
            scanned: [0; 8],
        }
    }

    /// Limit how many bridges may be nested below a root bus
    pub fn with_max_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Rebuild the registry from scratch.
    ///
    /// The host bridge at 00:00.0 decides the roots: a single-function host
    /// bridge means bus 0 is the only root. A multi-function host bridge
    /// makes each present function 1..=7 a root, scanned as the bus with
    /// the same number as the function.
    pub fn scan_all_bus(&mut self) -> Result<()> {
        self.registry.clear();
        self.scanned = [0; 8];

        let header_type = read_header_type(&mut self.config, 0, 0, 0);
        if is_single_function_device(header_type) {
            return self.scan_bus(0);
        }

        // Function 0 is not taken as bus 0 here. Bus 0 is only reached if a
        // bridge on another root points at it.
        for function in 1..MAX_FUNCTION {
            if read_vendor_id(&mut self.config, 0, 0, function) == INVALID_VENDOR_ID {
                continue;
            }
            self.scan_bus(function)?;
        }
        Ok(())
    }

    pub fn scan_bus(&mut self, bus: u8) -> Result<()> {
        self.scan_bus_at(bus, 0)
    }

    pub fn scan_device(&mut self, bus: u8, device: u8) -> Result<()> {
        self.scan_device_at(bus, device, 0)
    }

    pub fn scan_function(&mut self, bus: u8, device: u8, function: u8) -> Result<()> {
        self.scan_function_at(bus, device, function, 0)
    }

    pub fn is_bus_scanned(&self, bus: u8) -> bool {
        self.scanned[bus as usize / 32] & (1 << (bus % 32)) != 0
    }

    /// Returns false if the bus was already marked
    fn mark_scanned(&mut self, bus: u8) -> bool {
        if self.is_bus_scanned(bus) {
            return false;
        }
        self.scanned[bus as usize / 32] |= 1 << (bus % 32);
        true
    }

    fn scan_bus_at(&mut self, bus: u8, depth: u8) -> Result<()> {
        if !self.mark_scanned(bus) {
            warn!("bus {} already scanned, skipping", bus);
            return Ok(());
        }

        for device in 0..MAX_DEVICE {
            if read_vendor_id(&mut self.config, bus, device, 0) == INVALID_VENDOR_ID {
                continue;
            }
            self.scan_device_at(bus, device, depth)?;
        }
        Ok(())
    }

    fn scan_device_at(&mut self, bus: u8, device: u8, depth: u8) -> Result<()> {
        self.scan_function_at(bus, device, 0, depth)?;
        if is_single_function_device(read_header_type(&mut self.config, bus, device, 0)) {
            return Ok(());
        }

        for function in 1..MAX_FUNCTION {
            if read_vendor_id(&mut self.config, bus, device, function) == INVALID_VENDOR_ID {
                continue;
            }
            self.scan_function_at(bus, device, function, depth)?;
        }
        Ok(())
    }

    fn scan_function_at(&mut self, bus: u8, device: u8, function: u8, depth: u8) -> Result<()> {
        let class_code = read_class_code(&mut self.config, bus, device, function);
        let header_type = read_header_type(&mut self.config, bus, device, function);
        let found = Device::new(bus, device, function, header_type, class_code);

        self.registry.add(found)?;
        debug!("{}: class {}, head {:02x}", found, class_code, header_type);

        if class_code.matches_sub(PCI_TO_PCI_BRIDGE.0, PCI_TO_PCI_BRIDGE.1) {
            let secondary = read_bus_numbers(&mut self.config, bus, device, function).secondary;
            if depth >= self.max_depth {
                warn!("{}: bridge to bus {} nested past depth {}", found, secondary, self.max_depth);
                return Err(Error::BridgeDepthExceeded);
            }
            return self.scan_bus_at(secondary, depth + 1);
        }
        Ok(())
    }
}

/// Scan every bus into `registry` using the limits in `boot_config`
pub fn scan_all_bus<C, const N: usize>(config: &mut C, registry: &mut DeviceRegistry<N>, boot_config: &BootConfig) -> Result<()>
where
    C: ConfigSpace + ?Sized,
{
    PciBusScanner::new(config, registry)
        .with_max_depth(boot_config.max_bridge_depth)
        .scan_all_bus()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pci::sim::{FunctionConfig, SimulatedConfigSpace};
    use crate::pci::ClassCode;

    fn host_bridge() -> FunctionConfig {
        FunctionConfig::new(0, 0, 0, 0x8086, 0x1237).class(0x06, 0x00, 0x00)
    }

    fn nic(bus: u8, device: u8) -> FunctionConfig {
        FunctionConfig::new(bus, device, 0, 0x8086, 0x100E).class(0x02, 0x00, 0x00)
    }

    fn locations<const N: usize>(registry: &DeviceRegistry<N>) -> std::vec::Vec<(u8, u8, u8)> {
        registry.iter().map(Device::location).collect()
    }

    #[test]
    fn test_empty_bus_zero() {
        let mut config = SimulatedConfigSpace::<16>::new();
        let mut registry = DeviceRegistry::<32>::new();

        let result = PciBusScanner::new(&mut config, &mut registry).scan_all_bus();

        assert_eq!(result, Ok(()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sentinel_functions_are_not_recorded() {
        let mut config = SimulatedConfigSpace::<64>::new();
        config.add_function(host_bridge()).unwrap();
        config.add_function(nic(0, 3)).unwrap();
        let mut registry = DeviceRegistry::<32>::new();

        PciBusScanner::new(&mut config, &mut registry).scan_all_bus().unwrap();

        assert_eq!(locations(&registry), [(0, 0, 0), (0, 3, 0)]);
    }

    #[test]
    fn test_single_function_device_skips_other_functions() {
        let mut config = SimulatedConfigSpace::<64>::new();
        config.add_function(host_bridge()).unwrap();
        config.add_function(nic(0, 1)).unwrap();
        // Would be found if function 1 were probed
        config.add_function(FunctionConfig::new(0, 1, 1, 0x8086, 0x100F)).unwrap();
        let mut registry = DeviceRegistry::<32>::new();

        PciBusScanner::new(&mut config, &mut registry).scan_all_bus().unwrap();

        assert_eq!(registry.count(), 2);
        for function in 1..MAX_FUNCTION {
            assert!(!config.was_probed(0, 1, function));
        }
    }

    #[test]
    fn test_multi_function_device_contributes_each_function() {
        let mut config = SimulatedConfigSpace::<64>::new();
        config.add_function(host_bridge()).unwrap();
        config
            .add_function(FunctionConfig::new(0, 31, 0, 0x8086, 0x2918).class(0x06, 0x01, 0x00).multi_function())
            .unwrap();
        config
            .add_function(FunctionConfig::new(0, 31, 2, 0x8086, 0x2922).class(0x01, 0x06, 0x01))
            .unwrap();
        config
            .add_function(FunctionConfig::new(0, 31, 3, 0x8086, 0x2930).class(0x0C, 0x05, 0x00))
            .unwrap();
        let mut registry = DeviceRegistry::<32>::new();

        PciBusScanner::new(&mut config, &mut registry).scan_all_bus().unwrap();

        assert_eq!(locations(&registry), [(0, 0, 0), (0, 31, 0), (0, 31, 2), (0, 31, 3)]);
    }

    #[test]
    fn test_bridge_is_followed_depth_first() {
        let mut config = SimulatedConfigSpace::<64>::new();
        config.add_function(host_bridge()).unwrap();
        config.add_function(FunctionConfig::new(0, 1, 0, 0x8086, 0x244E).bridge_to(5)).unwrap();
        config.add_function(nic(0, 2)).unwrap();
        config.add_function(nic(5, 0)).unwrap();
        let mut registry = DeviceRegistry::<32>::new();

        PciBusScanner::new(&mut config, &mut registry).scan_all_bus().unwrap();

        assert_eq!(locations(&registry), [(0, 0, 0), (0, 1, 0), (5, 0, 0), (0, 2, 0)]);
        assert!(registry.get(1).is_pci_bridge());
    }

    #[test]
    fn test_registry_full_stops_scan() {
        let mut config = SimulatedConfigSpace::<256>::new();
        for bus in 0..2 {
            for device in 0..MAX_DEVICE {
                config.add_function(nic(bus, device)).unwrap();
            }
        }
        config.add_function(FunctionConfig::new(0, 31, 0, 0x8086, 0x244E).bridge_to(1)).unwrap();
        let mut registry = DeviceRegistry::<32>::new();

        let result = PciBusScanner::new(&mut config, &mut registry).scan_all_bus();

        assert_eq!(result, Err(Error::Full));
        assert_eq!(registry.count(), 32);
        // first 32 in scan order: bus 0 devices 0..=30, the bridge, nothing below it
        assert_eq!(registry.get(30).location(), (0, 30, 0));
        assert_eq!(registry.get(31).location(), (0, 31, 0));
    }

    #[test]
    fn test_rescan_clears_registry() {
        let mut config = SimulatedConfigSpace::<64>::new();
        config.add_function(host_bridge()).unwrap();
        config.add_function(nic(0, 4)).unwrap();
        let mut registry = DeviceRegistry::<32>::new();

        PciBusScanner::new(&mut config, &mut registry).scan_all_bus().unwrap();
        PciBusScanner::new(&mut config, &mut registry).scan_all_bus().unwrap();

        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_multi_function_host_bridge_roots() {
        let mut config = SimulatedConfigSpace::<64>::new();
        config.add_function(host_bridge().multi_function()).unwrap();
        config
            .add_function(FunctionConfig::new(0, 0, 2, 0x8086, 0x1238).class(0x06, 0x00, 0x00))
            .unwrap();
        config.add_function(nic(2, 4)).unwrap();
        let mut registry = DeviceRegistry::<32>::new();

        let mut scanner = PciBusScanner::new(&mut config, &mut registry);
        scanner.scan_all_bus().unwrap();
        assert!(scanner.is_bus_scanned(2));
        assert!(!scanner.is_bus_scanned(0));
        assert!(!scanner.is_bus_scanned(1));

        // function 2 of the host bridge names bus 2; bus 0 itself is never walked
        assert_eq!(locations(&registry), [(2, 4, 0)]);
    }

    #[test]
    fn test_bridge_depth_limit() {
        let mut config = SimulatedConfigSpace::<64>::new();
        config.add_function(host_bridge()).unwrap();
        config.add_function(FunctionConfig::new(0, 1, 0, 0x8086, 0x244E).bridge_to(1)).unwrap();
        config.add_function(FunctionConfig::new(1, 0, 0, 0x8086, 0x244E).bridge_to(2)).unwrap();
        config.add_function(FunctionConfig::new(2, 0, 0, 0x8086, 0x244E).bridge_to(3)).unwrap();
        config.add_function(nic(3, 0)).unwrap();

        let mut registry = DeviceRegistry::<32>::new();
        let result = PciBusScanner::new(&mut config, &mut registry).with_max_depth(3).scan_all_bus();
        assert_eq!(result, Ok(()));
        assert_eq!(registry.count(), 5);

        let mut registry = DeviceRegistry::<32>::new();
        let result = PciBusScanner::new(&mut config, &mut registry).with_max_depth(2).scan_all_bus();
        assert_eq!(result, Err(Error::BridgeDepthExceeded));
        // the offending bridge is recorded before the limit trips
        assert_eq!(registry.get(registry.count() - 1).location(), (2, 0, 0));
    }

    #[test]
    fn test_bridge_cycle_is_scanned_once() {
        let mut config = SimulatedConfigSpace::<64>::new();
        config.add_function(host_bridge()).unwrap();
        config.add_function(FunctionConfig::new(0, 1, 0, 0x8086, 0x244E).bridge_to(1)).unwrap();
        // points back at bus 0
        config.add_function(FunctionConfig::new(1, 0, 0, 0x8086, 0x244E).bridge_to(0)).unwrap();
        let mut registry = DeviceRegistry::<32>::new();

        PciBusScanner::new(&mut config, &mut registry).scan_all_bus().unwrap();

        assert_eq!(locations(&registry), [(0, 0, 0), (0, 1, 0), (1, 0, 0)]);
    }

    #[test]
    fn test_scan_all_bus_uses_boot_config() {
        let mut config = SimulatedConfigSpace::<64>::new();
        config.add_function(host_bridge()).unwrap();
        config.add_function(FunctionConfig::new(0, 1, 0, 0x8086, 0x244E).bridge_to(1)).unwrap();
        let mut registry = DeviceRegistry::<32>::new();

        let boot_config = BootConfig::DEFAULT.with_max_bridge_depth(0);
        assert_eq!(
            scan_all_bus(&mut config, &mut registry, &boot_config),
            Err(Error::BridgeDepthExceeded)
        );
        assert_eq!(
            scan_all_bus(&mut config, &mut registry, &BootConfig::DEFAULT),
            Ok(())
        );
        assert_eq!(registry.get(1).class_code, ClassCode::new(0x06, 0x04, 0x00));
    }
}
