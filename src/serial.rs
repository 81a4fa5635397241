//! Serial Port Log Sink
//!
//! COM1 through the UART 16550, wrapped in the kernel logger.

use core::fmt::Write;

use lazy_static::lazy_static;
use log::{LevelFilter, SetLoggerError};
use rustos_discovery::config::BootConfig;
use rustos_discovery::logging::{self, KernelLogger};
use uart_16550::SerialPort;

lazy_static! {
    /// Logger writing to COM1 (0x3F8)
    pub static ref LOGGER: KernelLogger<SerialPort> = {
        let mut serial_port = unsafe { SerialPort::new(0x3F8) };
        serial_port.init();
        KernelLogger::new(serial_port, BootConfig::DEFAULT.log_level)
    };
}

/// Route the `log` macros to COM1
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    logging::init(&*LOGGER, level)
}

/// Write formatted arguments to COM1, bypassing the log facade
pub fn _print_serial(args: core::fmt::Arguments) {
    LOGGER.with_output(|serial| {
        let _ = serial.write_fmt(args);
    });
}

/// Serial print macro
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => ($crate::serial::_print_serial(format_args!($($arg)*)));
}

/// Serial println macro
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($fmt:expr) => ($crate::serial_print!(concat!($fmt, "\n")));
    ($fmt:expr, $($arg:tt)*) => ($crate::serial_print!(concat!($fmt, "\n"), $($arg)*));
}
