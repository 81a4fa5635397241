//! Boot configuration
//!
//! Knobs for the discovery pass. There is no command line or file system
//! this early in boot, so the kernel passes [`BootConfig::DEFAULT`] or a
//! variant built from it.

use log::LevelFilter;

/// Settings for the boot-time PCI discovery pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootConfig {
    /// Maximum level forwarded to the diagnostic sink
    pub log_level: LevelFilter,
    /// How many PCI-to-PCI bridges may be nested below a root bus.
    /// A `u8` can never exceed the 255 secondary buses PCI allows.
    pub max_bridge_depth: u8,
    /// Pick an Intel xHC over other vendors when several are present
    pub prefer_intel_xhc: bool,
    /// Turn on memory decoding and bus mastering before the handoff
    pub enable_xhc_bus_master: bool,
}

impl BootConfig {
    pub const DEFAULT: BootConfig = BootConfig {
        log_level: LevelFilter::Info,
        max_bridge_depth: 32,
        prefer_intel_xhc: true,
        enable_xhc_bus_master: true,
    };

    pub const fn with_max_bridge_depth(mut self, depth: u8) -> Self {
        self.max_bridge_depth = depth;
        self
    }

    pub const fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
