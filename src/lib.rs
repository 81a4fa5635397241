//! RustOS early boot discovery
//!
//! PCI enumeration over configuration mechanism #1, a fixed-capacity device
//! registry, BAR decoding and the xHC handoff that follows them.

#![cfg_attr(not(test), no_std)]

pub mod boot;
pub mod config;
pub mod error;
pub mod logging;
pub mod pci;
pub mod usb;

pub use config::BootConfig;
pub use error::{Error, Result, WithError};
