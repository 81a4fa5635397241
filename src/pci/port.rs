//! Configuration-space port driver
//!
//! Configuration mechanism #1 is a two-step protocol: write the target
//! address to CONFIG_ADDRESS, then read or write CONFIG_DATA. The pair is not
//! atomic, so every access goes through a [`ConfigSpace`] borrowed mutably,
//! and the hardware instance lives behind a single lock ([`CONFIG_SPACE`]).

/// PCI Configuration Address Port (0xCF8)
pub const PCI_CONFIG_ADDRESS: u16 = 0x0CF8;
/// PCI Configuration Data Port (0xCFC)
pub const PCI_CONFIG_DATA: u16 = 0x0CFC;

/// Raw access to PCI configuration space.
///
/// Implementations do no validation. A caller must not interleave its own
/// address/data pair with another one; taking `&mut self` makes the borrow
/// checker enforce that within one instance.
pub trait ConfigSpace {
    /// Latch a configuration address (see [`make_address`](super::make_address))
    fn write_address(&mut self, address: u32);
    /// Write the dword at the latched address
    fn write_data(&mut self, value: u32);
    /// Read the dword at the latched address
    fn read_data(&mut self) -> u32;
}

impl<C: ConfigSpace + ?Sized> ConfigSpace for &mut C {
    fn write_address(&mut self, address: u32) {
        (**self).write_address(address)
    }

    fn write_data(&mut self, value: u32) {
        (**self).write_data(value)
    }

    fn read_data(&mut self) -> u32 {
        (**self).read_data()
    }
}

#[cfg(target_arch = "x86_64")]
pub use hardware::{PortConfigSpace, CONFIG_SPACE};

#[cfg(target_arch = "x86_64")]
mod hardware {
    use super::{ConfigSpace, PCI_CONFIG_ADDRESS, PCI_CONFIG_DATA};
    use lazy_static::lazy_static;
    use spin::Mutex;
    use x86_64::instructions::port::Port;

    /// Configuration space reached through the legacy x86 I/O ports
    pub struct PortConfigSpace {
        address: Port<u32>,
        data: Port<u32>,
    }

    impl PortConfigSpace {
        /// # Safety
        ///
        /// Ports 0xCF8/0xCFC must implement PCI configuration mechanism #1,
        /// and no other `PortConfigSpace` may be used at the same time.
        pub unsafe fn new() -> Self {
            Self {
                address: Port::new(PCI_CONFIG_ADDRESS),
                data: Port::new(PCI_CONFIG_DATA),
            }
        }
    }

    impl ConfigSpace for PortConfigSpace {
        fn write_address(&mut self, address: u32) {
            unsafe { self.address.write(address) }
        }

        fn write_data(&mut self, value: u32) {
            unsafe { self.data.write(value) }
        }

        fn read_data(&mut self) -> u32 {
            unsafe { self.data.read() }
        }
    }

    lazy_static! {
        /// The machine's configuration space. Hold the guard for the whole
        /// address/data exchange once interrupts or other cores exist.
        pub static ref CONFIG_SPACE: Mutex<PortConfigSpace> =
            Mutex::new(unsafe { PortConfigSpace::new() });
    }
}
