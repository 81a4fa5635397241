//! Base Address Register decoding
//!
//! Bit 0 selects I/O or memory space. For memory BARs bits 1-2 give the
//! width and bit 3 marks the window prefetchable; a 64-bit BAR takes the
//! next slot as its upper dword.

use core::fmt;

use super::config::{read_conf_reg, PCI_BAR0};
use super::{ConfigSpace, Device};
use crate::error::{Error, Result};

/// Number of BAR slots in a type 0 header
pub const BAR_COUNT: u8 = 6;

const BAR_IO_SPACE: u32 = 0x1;
const BAR_IO_MASK: u32 = !0x3;
const BAR_MEMORY_MASK: u32 = !0xF;
const BAR_PREFETCHABLE: u32 = 0x8;

/// Register offset of BAR `index`
pub const fn calc_bar_address(index: u8) -> u8 {
    PCI_BAR0.wrapping_add(index.wrapping_mul(4))
}

/// Decoded BAR contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bar {
    Io { port: u32 },
    Memory32 { base: u32, prefetchable: bool },
    Memory64 { base: u64, prefetchable: bool },
}

impl Bar {
    /// Base address with the flag bits stripped
    pub fn base(&self) -> u64 {
        match *self {
            Bar::Io { port } => port as u64,
            Bar::Memory32 { base, .. } => base as u64,
            Bar::Memory64 { base, .. } => base,
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Bar::Io { .. })
    }

    pub fn is_prefetchable(&self) -> bool {
        match *self {
            Bar::Io { .. } => false,
            Bar::Memory32 { prefetchable, .. } | Bar::Memory64 { prefetchable, .. } => prefetchable,
        }
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bar::Io { port } => write!(f, "I/O {:#x}", port),
            Bar::Memory32 { base, prefetchable } => {
                write!(f, "MEM32 {:#010x}{}", base, if *prefetchable { " (prefetchable)" } else { "" })
            }
            Bar::Memory64 { base, prefetchable } => {
                write!(f, "MEM64 {:#018x}{}", base, if *prefetchable { " (prefetchable)" } else { "" })
            }
        }
    }
}

/// Read and decode BAR `index` of `device`
pub fn decode_bar<C: ConfigSpace + ?Sized>(config: &mut C, device: &Device, index: u8) -> Result<Bar> {
    if index >= BAR_COUNT {
        return Err(Error::IndexOutOfRange);
    }

    let low = read_conf_reg(config, device, calc_bar_address(index));
    if low & BAR_IO_SPACE != 0 {
        return Ok(Bar::Io { port: low & BAR_IO_MASK });
    }

    let prefetchable = low & BAR_PREFETCHABLE != 0;
    match (low >> 1) & 0x3 {
        // 0b01 is the legacy below-1MiB type, still a 32-bit address
        0b00 | 0b01 => Ok(Bar::Memory32 {
            base: low & BAR_MEMORY_MASK,
            prefetchable,
        }),
        0b10 => {
            if index + 1 >= BAR_COUNT {
                return Err(Error::IndexOutOfRange);
            }
            let high = read_conf_reg(config, device, calc_bar_address(index + 1));
            Ok(Bar::Memory64 {
                base: (high as u64) << 32 | (low & BAR_MEMORY_MASK) as u64,
                prefetchable,
            })
        }
        _ => Err(Error::UnsupportedBarType),
    }
}

/// Resolve BAR `index` of `device` to its base address
pub fn read_bar<C: ConfigSpace + ?Sized>(config: &mut C, device: &Device, index: u8) -> Result<u64> {
    decode_bar(config, device, index).map(|bar| bar.base())
}
