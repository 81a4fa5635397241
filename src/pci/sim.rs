//! Software configuration space
//!
//! A [`ConfigSpace`] backed by a small table of register values instead of
//! I/O ports. It follows the same latch-then-access protocol as the
//! hardware, so the scanner and BAR code run against it unchanged on a host.

use heapless::Vec;
use log::warn;

use super::config::{make_address, BusNumbers, PCI_BAR0, PCI_BUS_NUMBERS, PCI_CLASS_REVISION, PCI_HEADER_TYPE, PCI_VENDOR_ID};
use super::{ClassCode, ConfigSpace, PCI_TO_PCI_BRIDGE};
use crate::error::{Error, Result};

/// Strips the enable bit so a register key only carries bus/device/function/offset
const KEY_MASK: u32 = 0x00FF_FFFC;
/// Bus, device and function bits of a key
const FUNCTION_MASK: u32 = 0x00FF_FF00;

const PROBE_WORDS: usize = 256 * 32 * 8 / 32;

/// Simulated configuration space holding up to `N` populated registers.
///
/// A function exists when its vendor register has been set. Reads from
/// functions that do not exist return all-ones; unset registers of existing
/// functions read as zero.
pub struct SimulatedConfigSpace<const N: usize = 256> {
    registers: Vec<(u32, u32), N>,
    address: u32,
    probed: [u32; PROBE_WORDS],
}

impl<const N: usize> SimulatedConfigSpace<N> {
    pub fn new() -> Self {
        Self {
            registers: Vec::new(),
            address: 0,
            probed: [0; PROBE_WORDS],
        }
    }

    fn lookup(&self, key: u32) -> Option<u32> {
        self.registers.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    fn function_present(&self, key: u32) -> bool {
        self.lookup(key & FUNCTION_MASK).is_some()
    }

    fn store(&mut self, key: u32, value: u32) -> Result<()> {
        if let Some(slot) = self.registers.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
            return Ok(());
        }
        self.registers.push((key, value)).map_err(|_| Error::Full)
    }

    /// Set one register of a function directly, bypassing the ports
    pub fn set_register(&mut self, bus: u8, device: u8, function: u8, register: u8, value: u32) -> Result<()> {
        self.store(make_address(bus, device, function, register) & KEY_MASK, value)
    }

    /// Populate every register described by `function`
    pub fn add_function(&mut self, function: FunctionConfig) -> Result<()> {
        let FunctionConfig { bus, device, function: func, .. } = function;

        self.set_register(bus, device, func, PCI_VENDOR_ID, (function.device_id as u32) << 16 | function.vendor_id as u32)?;
        let class = function.class_code;
        self.set_register(
            bus,
            device,
            func,
            PCI_CLASS_REVISION,
            (class.base as u32) << 24 | (class.sub as u32) << 16 | (class.interface as u32) << 8 | function.revision as u32,
        )?;
        self.set_register(bus, device, func, PCI_HEADER_TYPE, (function.header_type as u32) << 16)?;

        for (index, bar) in function.bars.iter().enumerate() {
            if let Some(value) = bar {
                self.set_register(bus, device, func, PCI_BAR0 + 4 * index as u8, *value)?;
            }
        }

        if let Some(numbers) = function.bus_numbers {
            let raw = numbers.primary as u32 | (numbers.secondary as u32) << 8 | (numbers.subordinate as u32) << 16;
            self.set_register(bus, device, func, PCI_BUS_NUMBERS, raw)?;
        }
        Ok(())
    }

    fn probe_index(key: u32) -> (usize, u32) {
        let function = (key >> 8) as usize & 0xFFFF;
        (function / 32, 1 << (function % 32))
    }

    /// Whether any register of the function was read through the data port
    pub fn was_probed(&self, bus: u8, device: u8, function: u8) -> bool {
        let (word, bit) = Self::probe_index(make_address(bus, device, function, 0) & KEY_MASK);
        self.probed[word] & bit != 0
    }

    pub fn clear_probes(&mut self) {
        self.probed = [0; PROBE_WORDS];
    }
}

impl<const N: usize> Default for SimulatedConfigSpace<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ConfigSpace for SimulatedConfigSpace<N> {
    fn write_address(&mut self, address: u32) {
        self.address = address;
    }

    fn write_data(&mut self, value: u32) {
        let key = self.address & KEY_MASK;
        if !self.function_present(key) {
            return;
        }
        if self.store(key, value).is_err() {
            warn!("config write to {:08x} dropped: register table full", self.address);
        }
    }

    fn read_data(&mut self) -> u32 {
        if self.address & (1 << 31) == 0 {
            return 0xFFFF_FFFF;
        }
        let key = self.address & KEY_MASK;
        let (word, bit) = Self::probe_index(key);
        self.probed[word] |= bit;

        match self.lookup(key) {
            Some(value) => value,
            None if self.function_present(key) => 0,
            None => 0xFFFF_FFFF,
        }
    }
}

/// Register contents of one simulated function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionConfig {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
    pub vendor_id: u16,
    pub device_id: u16,
    pub class_code: ClassCode,
    pub revision: u8,
    pub header_type: u8,
    pub bus_numbers: Option<BusNumbers>,
    pub bars: [Option<u32>; 6],
}

impl FunctionConfig {
    pub fn new(bus: u8, device: u8, function: u8, vendor_id: u16, device_id: u16) -> Self {
        Self {
            bus,
            device,
            function,
            vendor_id,
            device_id,
            class_code: ClassCode::default(),
            revision: 0,
            header_type: 0,
            bus_numbers: None,
            bars: [None; 6],
        }
    }

    pub fn class(mut self, base: u8, sub: u8, interface: u8) -> Self {
        self.class_code = ClassCode::new(base, sub, interface);
        self
    }

    pub fn revision(mut self, revision: u8) -> Self {
        self.revision = revision;
        self
    }

    /// Raw header type byte, including the multi-function bit
    pub fn header_type(mut self, header_type: u8) -> Self {
        self.header_type = header_type;
        self
    }

    pub fn multi_function(mut self) -> Self {
        self.header_type |= 0x80;
        self
    }

    /// Make this function a PCI-to-PCI bridge forwarding to `secondary`
    pub fn bridge_to(mut self, secondary: u8) -> Self {
        self.class_code = ClassCode::new(PCI_TO_PCI_BRIDGE.0, PCI_TO_PCI_BRIDGE.1, 0x00);
        self.header_type = (self.header_type & 0x80) | 0x01;
        self.bus_numbers = Some(BusNumbers {
            primary: self.bus,
            secondary,
            subordinate: secondary,
        });
        self
    }

    /// # Panics
    ///
    /// Panics if `index` is not below 6.
    pub fn bar(mut self, index: usize, value: u32) -> Self {
        self.bars[index] = Some(value);
        self
    }
}
