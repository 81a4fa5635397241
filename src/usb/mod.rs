//! USB host controllers
//!
//! Only the boot handoff lives here: picking the xHC out of the PCI device
//! list and recording where its registers are mapped.

pub mod xhci;
