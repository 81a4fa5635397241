//! RustOS discovery kernel
//!
//! Boots through `bootloader`, logs to COM1, enumerates PCI and hands the
//! xHC's MMIO base on before halting.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod serial;

#[cfg(target_os = "none")]
mod kernel {
    use bootloader::{entry_point, BootInfo};
    use core::panic::PanicInfo;
    use log::{error, info};
    use rustos_discovery::{boot, pci, BootConfig};

    use crate::serial;
    use crate::serial_println;

    entry_point!(kernel_main);

    fn kernel_main(_boot_info: &'static BootInfo) -> ! {
        let boot_config = BootConfig::DEFAULT;
        if serial::init(boot_config.log_level).is_err() {
            serial_println!("logger already installed");
        }
        info!("RustOS v{} starting PCI discovery", env!("CARGO_PKG_VERSION"));

        let result = {
            let mut config_space = pci::port::CONFIG_SPACE.lock();
            let mut devices = pci::DEVICES.lock();
            boot::run(&mut *config_space, &mut *devices, &boot_config)
        };

        match result {
            Ok(controller) => info!("xHC handoff: mmio_base={:#x}", controller.mmio_base()),
            Err(err) => error!("xHC handoff failed: {}", err),
        }

        info!("discovery finished, halting");
        hlt_loop()
    }

    pub fn hlt_loop() -> ! {
        loop {
            x86_64::instructions::hlt();
        }
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        serial_println!("KERNEL PANIC: {}", info);
        hlt_loop()
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("rustos runs on bare metal; build it with `cargo bootimage`");
    std::process::exit(1);
}
