//! PCI Bus Enumeration
//!
//! Boot-time discovery of PCI functions through configuration mechanism #1
//! (I/O ports 0xCF8/0xCFC). The scan fills a fixed-capacity
//! [`DeviceRegistry`]; later boot code picks devices out of it by class code
//! and resolves their BARs.

pub mod bar;
pub mod config;
pub mod database;
pub mod port;
pub mod registry;
pub mod scan;
pub mod sim;

use core::fmt;

use spin::Mutex;

pub use bar::{calc_bar_address, read_bar, Bar};
pub use config::{is_single_function_device, make_address, BusNumbers};
pub use port::ConfigSpace;
pub use registry::{DeviceRegistry, DEVICE_CAPACITY};
pub use scan::{scan_all_bus, PciBusScanner};

/// Maximum number of devices per bus
pub const MAX_DEVICE: u8 = 32;
/// Maximum number of functions per device
pub const MAX_FUNCTION: u8 = 8;

/// Vendor ID read back from a function that does not exist
pub const INVALID_VENDOR_ID: u16 = 0xFFFF;

/// Class code of a PCI-to-PCI bridge (base, sub)
pub const PCI_TO_PCI_BRIDGE: (u8, u8) = (0x06, 0x04);

/// Devices discovered during boot
pub static DEVICES: Mutex<DeviceRegistry> = Mutex::new(DeviceRegistry::new());

/// Base class, subclass and programming interface of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassCode {
    pub base: u8,
    pub sub: u8,
    pub interface: u8,
}

impl ClassCode {
    pub const fn new(base: u8, sub: u8, interface: u8) -> Self {
        Self { base, sub, interface }
    }

    /// Decode the class register (offset 0x08); the revision byte is dropped
    pub const fn from_register(reg: u32) -> Self {
        Self {
            base: (reg >> 24) as u8,
            sub: (reg >> 16) as u8,
            interface: (reg >> 8) as u8,
        }
    }

    pub fn matches_base(&self, base: u8) -> bool {
        self.base == base
    }

    pub fn matches_sub(&self, base: u8, sub: u8) -> bool {
        self.matches_base(base) && self.sub == sub
    }

    pub fn matches(&self, base: u8, sub: u8, interface: u8) -> bool {
        self.matches_sub(base, sub) && self.interface == interface
    }
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.base, self.sub, self.interface)
    }
}

/// One discovered PCI function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
    pub header_type: u8,
    pub class_code: ClassCode,
}

impl Device {
    pub const fn new(bus: u8, device: u8, function: u8, header_type: u8, class_code: ClassCode) -> Self {
        Self {
            bus,
            device,
            function,
            header_type,
            class_code,
        }
    }

    /// Check if this is a multifunction device
    pub fn is_multi_function(&self) -> bool {
        !is_single_function_device(self.header_type)
    }

    /// Get the base header type (without multifunction bit)
    pub fn base_header_type(&self) -> u8 {
        self.header_type & 0x7F
    }

    pub fn is_pci_bridge(&self) -> bool {
        self.class_code.matches_sub(PCI_TO_PCI_BRIDGE.0, PCI_TO_PCI_BRIDGE.1)
    }

    pub fn location(&self) -> (u8, u8, u8) {
        (self.bus, self.device, self.function)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02x}:{:02x}.{}", self.bus, self.device, self.function)
    }
}
