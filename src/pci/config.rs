//! PCI Configuration Space Access
//!
//! Address encoding for configuration mechanism #1 and typed readers for the
//! header fields the discovery pass needs. Each reader is exactly one
//! address write followed by one data access.

use bitflags::bitflags;

use super::{ClassCode, ConfigSpace, Device};

/// PCI Configuration Registers
pub const PCI_VENDOR_ID: u8 = 0x00;
pub const PCI_COMMAND: u8 = 0x04;
pub const PCI_CLASS_REVISION: u8 = 0x08;
pub const PCI_HEADER_TYPE: u8 = 0x0C;
pub const PCI_BAR0: u8 = 0x10;
pub const PCI_BUS_NUMBERS: u8 = 0x18;

const CONFIG_ENABLE: u32 = 1 << 31;

bitflags! {
    /// PCI Command Register bits
    pub struct Command: u16 {
        const IO_SPACE = 0x0001;
        const MEMORY_SPACE = 0x0002;
        const BUS_MASTER = 0x0004;
        const SPECIAL_CYCLES = 0x0008;
        const MEMORY_WRITE_INVALIDATE = 0x0010;
        const VGA_PALETTE_SNOOP = 0x0020;
        const PARITY_ERROR_RESPONSE = 0x0040;
        const SERR = 0x0100;
        const FAST_BACK_TO_BACK = 0x0200;
        const INTX_DISABLE = 0x0400;
    }
}

/// Encode a CONFIG_ADDRESS value.
///
/// Device is truncated to 5 bits and function to 3 bits; the register offset
/// is forced to a dword boundary. Nothing is rejected.
pub const fn make_address(bus: u8, device: u8, function: u8, register: u8) -> u32 {
    CONFIG_ENABLE
        | (bus as u32) << 16
        | ((device & 0x1F) as u32) << 11
        | ((function & 0x07) as u32) << 8
        | (register & 0xFC) as u32
}

/// Bit 7 of the header type marks a multi-function device
pub const fn is_single_function_device(header_type: u8) -> bool {
    header_type & 0x80 == 0
}

/// Read a raw configuration dword
pub fn read_register<C>(config: &mut C, bus: u8, device: u8, function: u8, register: u8) -> u32
where
    C: ConfigSpace + ?Sized,
{
    config.write_address(make_address(bus, device, function, register));
    config.read_data()
}

/// Write a raw configuration dword
pub fn write_register<C>(config: &mut C, bus: u8, device: u8, function: u8, register: u8, value: u32)
where
    C: ConfigSpace + ?Sized,
{
    config.write_address(make_address(bus, device, function, register));
    config.write_data(value);
}

pub fn read_conf_reg<C: ConfigSpace + ?Sized>(config: &mut C, device: &Device, register: u8) -> u32 {
    read_register(config, device.bus, device.device, device.function, register)
}

pub fn write_conf_reg<C: ConfigSpace + ?Sized>(config: &mut C, device: &Device, register: u8, value: u32) {
    write_register(config, device.bus, device.device, device.function, register, value)
}

pub fn read_vendor_id<C: ConfigSpace + ?Sized>(config: &mut C, bus: u8, device: u8, function: u8) -> u16 {
    read_register(config, bus, device, function, PCI_VENDOR_ID) as u16
}

pub fn read_device_id<C: ConfigSpace + ?Sized>(config: &mut C, bus: u8, device: u8, function: u8) -> u16 {
    (read_register(config, bus, device, function, PCI_VENDOR_ID) >> 16) as u16
}

pub fn read_header_type<C: ConfigSpace + ?Sized>(config: &mut C, bus: u8, device: u8, function: u8) -> u8 {
    (read_register(config, bus, device, function, PCI_HEADER_TYPE) >> 16) as u8
}

pub fn read_class_code<C: ConfigSpace + ?Sized>(config: &mut C, bus: u8, device: u8, function: u8) -> ClassCode {
    ClassCode::from_register(read_register(config, bus, device, function, PCI_CLASS_REVISION))
}

/// Bus numbers of a PCI-to-PCI bridge (type 1 header, offset 0x18)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusNumbers {
    pub primary: u8,
    pub secondary: u8,
    pub subordinate: u8,
}

impl BusNumbers {
    pub const fn from_raw(reg: u32) -> Self {
        Self {
            primary: reg as u8,
            secondary: (reg >> 8) as u8,
            subordinate: (reg >> 16) as u8,
        }
    }
}

pub fn read_bus_numbers<C: ConfigSpace + ?Sized>(config: &mut C, bus: u8, device: u8, function: u8) -> BusNumbers {
    BusNumbers::from_raw(read_register(config, bus, device, function, PCI_BUS_NUMBERS))
}

pub fn read_command<C: ConfigSpace + ?Sized>(config: &mut C, device: &Device) -> Command {
    Command::from_bits_truncate(read_conf_reg(config, device, PCI_COMMAND) as u16)
}

/// Replace the command register. The status half of the dword is written
/// as zero, which leaves its write-one-to-clear bits alone.
pub fn write_command<C: ConfigSpace + ?Sized>(config: &mut C, device: &Device, command: Command) {
    write_conf_reg(config, device, PCI_COMMAND, command.bits() as u32)
}

/// Let the function decode its memory BARs and master the bus
pub fn enable_memory_and_bus_master<C: ConfigSpace + ?Sized>(config: &mut C, device: &Device) -> Command {
    let command = read_command(config, device) | Command::MEMORY_SPACE | Command::BUS_MASTER;
    write_command(config, device, command);
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pci::sim::{FunctionConfig, SimulatedConfigSpace};

    #[test]
    fn test_make_address_layout() {
        assert_eq!(make_address(0, 0, 0, 0), 0x8000_0000);
        assert_eq!(make_address(0x12, 0x1F, 7, 0x3C), 0x8012_FF3C);
        assert_eq!(make_address(0xFF, 0, 0, 0), 0x80FF_0000);
        assert_eq!(make_address(0, 1, 0, 0), 0x8000_0800);
        assert_eq!(make_address(0, 0, 1, 0), 0x8000_0100);
    }

    #[test]
    fn test_make_address_masks_fields() {
        // low two register bits never reach the port
        assert_eq!(make_address(0, 0, 0, 0x0E), make_address(0, 0, 0, 0x0C));
        assert_eq!(make_address(0, 0, 0, 0x0E) & 0x3, 0);
        // out-of-range device and function wrap instead of spilling into bus
        assert_eq!(make_address(0, 33, 0, 0), make_address(0, 1, 0, 0));
        assert_eq!(make_address(0, 0, 9, 0), make_address(0, 0, 1, 0));
    }

    #[test]
    fn test_single_function_bit() {
        assert!(is_single_function_device(0x00));
        assert!(is_single_function_device(0x01));
        assert!(!is_single_function_device(0x80));
        assert!(!is_single_function_device(0x81));
    }

    #[test]
    fn test_field_readers() {
        let mut config = SimulatedConfigSpace::<64>::new();
        config
            .add_function(
                FunctionConfig::new(0, 3, 0, 0x8086, 0x1234)
                    .class(0x0C, 0x03, 0x30)
                    .header_type(0x80),
            )
            .unwrap();

        assert_eq!(read_vendor_id(&mut config, 0, 3, 0), 0x8086);
        assert_eq!(read_device_id(&mut config, 0, 3, 0), 0x1234);
        assert_eq!(read_header_type(&mut config, 0, 3, 0), 0x80);
        assert_eq!(read_class_code(&mut config, 0, 3, 0), ClassCode::new(0x0C, 0x03, 0x30));
        // absent function reads all-ones
        assert_eq!(read_vendor_id(&mut config, 0, 4, 0), 0xFFFF);
    }

    #[test]
    fn test_bus_numbers_decode() {
        let numbers = BusNumbers::from_raw(0x0007_0501);
        assert_eq!(numbers.primary, 1);
        assert_eq!(numbers.secondary, 5);
        assert_eq!(numbers.subordinate, 7);
    }

    #[test]
    fn test_enable_memory_and_bus_master() {
        let mut config = SimulatedConfigSpace::<64>::new();
        config
            .add_function(FunctionConfig::new(0, 2, 0, 0x1B36, 0x000D).class(0x0C, 0x03, 0x30))
            .unwrap();
        let device = Device::new(0, 2, 0, 0, ClassCode::new(0x0C, 0x03, 0x30));

        write_command(&mut config, &device, Command::IO_SPACE);
        let command = enable_memory_and_bus_master(&mut config, &device);

        assert_eq!(command, Command::IO_SPACE | Command::MEMORY_SPACE | Command::BUS_MASTER);
        assert_eq!(read_command(&mut config, &device), command);
    }
}
