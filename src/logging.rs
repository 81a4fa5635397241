// RustOS boot logging
// Structured log lines routed from the `log` facade to a text sink

use core::fmt::{self, Write};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

/// Logger that formats every record as one line on a text sink.
///
/// The sink is anything implementing [`core::fmt::Write`]: the COM1 serial
/// port on hardware, a `String` in tests.
pub struct KernelLogger<W> {
    output: Mutex<W>,
    level: LevelFilter,
}

impl<W: Write + Send> KernelLogger<W> {
    pub const fn new(output: W, level: LevelFilter) -> Self {
        Self {
            output: Mutex::new(output),
            level,
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Run `f` with exclusive access to the sink
    pub fn with_output<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.output.lock())
    }

    fn write_record(output: &mut W, record: &Record) -> fmt::Result {
        let module = record.module_path().unwrap_or_else(|| record.target());
        let module = module.rsplit("::").next().unwrap_or(module);
        writeln!(output, "{:5} {:12} {}", record.level(), module, record.args())
    }
}

impl<W: Write + Send> Log for KernelLogger<W> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut output = self.output.lock();
        // A sink that cannot take the line has nowhere else to report it.
        let _ = Self::write_record(&mut output, record);
    }

    fn flush(&self) {
        // Serial output is immediate
    }
}

/// Install `logger` as the global `log` backend
pub fn init(logger: &'static dyn Log, level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}
