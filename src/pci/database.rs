//! PCI Device Database
//!
//! Vendor and class names for the boot log. Unknown IDs are not an error,
//! they just print as "Unknown".

/// PCI Vendor Information
#[derive(Debug, Clone, Copy)]
pub struct VendorInfo {
    pub id: u16,
    pub name: &'static str,
    pub short_name: &'static str,
}

/// Name of a (base, sub) class pair
#[derive(Debug, Clone, Copy)]
pub struct ClassInfo {
    pub base: u8,
    pub sub: u8,
    pub name: &'static str,
}

/// Intel's vendor ID
pub const VENDOR_INTEL: u16 = 0x8086;

/// Vendors commonly seen on PCs and in emulators
pub const VENDORS: &[VendorInfo] = &[
    VendorInfo { id: VENDOR_INTEL, name: "Intel Corporation", short_name: "Intel" },
    VendorInfo { id: 0x1022, name: "Advanced Micro Devices, Inc. [AMD]", short_name: "AMD" },
    VendorInfo { id: 0x10DE, name: "NVIDIA Corporation", short_name: "NVIDIA" },
    VendorInfo { id: 0x1002, name: "Advanced Micro Devices, Inc. [AMD/ATI]", short_name: "AMD/ATI" },
    VendorInfo { id: 0x1106, name: "VIA Technologies, Inc.", short_name: "VIA" },
    VendorInfo { id: 0x10EC, name: "Realtek Semiconductor Co., Ltd.", short_name: "Realtek" },
    VendorInfo { id: 0x1B21, name: "ASMedia Technology Inc.", short_name: "ASMedia" },
    VendorInfo { id: 0x1033, name: "NEC Corporation", short_name: "NEC" },
    VendorInfo { id: 0x1912, name: "Renesas Technology Corp.", short_name: "Renesas" },
    VendorInfo { id: 0x104C, name: "Texas Instruments", short_name: "TI" },
    VendorInfo { id: 0x1B36, name: "Red Hat, Inc. (QEMU)", short_name: "QEMU" },
    VendorInfo { id: 0x1AF4, name: "Red Hat, Inc.", short_name: "RedHat" },
    VendorInfo { id: 0x1234, name: "Technical Corp.", short_name: "Bochs" },
    VendorInfo { id: 0x15AD, name: "VMware", short_name: "VMware" },
    VendorInfo { id: 0x80EE, name: "InnoTek Systemberatung GmbH", short_name: "VirtualBox" },
];

/// Subclasses worth naming; anything else falls back to the base class
pub const CLASSES: &[ClassInfo] = &[
    ClassInfo { base: 0x01, sub: 0x01, name: "IDE Controller" },
    ClassInfo { base: 0x01, sub: 0x06, name: "SATA Controller" },
    ClassInfo { base: 0x01, sub: 0x08, name: "NVM Controller" },
    ClassInfo { base: 0x02, sub: 0x00, name: "Ethernet Controller" },
    ClassInfo { base: 0x03, sub: 0x00, name: "VGA Controller" },
    ClassInfo { base: 0x04, sub: 0x03, name: "Audio Device" },
    ClassInfo { base: 0x06, sub: 0x00, name: "Host Bridge" },
    ClassInfo { base: 0x06, sub: 0x01, name: "ISA Bridge" },
    ClassInfo { base: 0x06, sub: 0x04, name: "PCI-to-PCI Bridge" },
    ClassInfo { base: 0x06, sub: 0x80, name: "Other Bridge" },
    ClassInfo { base: 0x0C, sub: 0x03, name: "USB Controller" },
    ClassInfo { base: 0x0C, sub: 0x05, name: "SMBus Controller" },
];

/// Get vendor name by vendor ID
pub fn vendor_name(vendor_id: u16) -> &'static str {
    VENDORS
        .iter()
        .find(|vendor| vendor.id == vendor_id)
        .map_or("Unknown", |vendor| vendor.short_name)
}

/// Get full vendor information by vendor ID
pub fn vendor_info(vendor_id: u16) -> Option<&'static VendorInfo> {
    VENDORS.iter().find(|vendor| vendor.id == vendor_id)
}

/// Name of a base class, as in the PCI code and ID assignment tables
pub fn base_class_name(base: u8) -> &'static str {
    match base {
        0x00 => "Unclassified",
        0x01 => "Mass Storage",
        0x02 => "Network",
        0x03 => "Display",
        0x04 => "Multimedia",
        0x05 => "Memory",
        0x06 => "Bridge",
        0x07 => "Communication",
        0x08 => "System Peripheral",
        0x09 => "Input Device",
        0x0A => "Docking Station",
        0x0B => "Processor",
        0x0C => "Serial Bus",
        0x0D => "Wireless",
        0x0E => "Intelligent I/O",
        0x0F => "Satellite",
        0x10 => "Encryption",
        0x11 => "Signal Processing",
        0x12 => "Processing Accelerator",
        0x13 => "Non-Essential Instrumentation",
        _ => "Unknown",
    }
}

/// Most specific name known for a (base, sub) class pair
pub fn class_name(base: u8, sub: u8) -> &'static str {
    CLASSES
        .iter()
        .find(|class| class.base == base && class.sub == sub)
        .map_or_else(|| base_class_name(base), |class| class.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_lookup() {
        assert_eq!(vendor_name(0x8086), "Intel");
        assert_eq!(vendor_name(0x1B36), "QEMU");
        assert_eq!(vendor_name(0xFFFE), "Unknown");
        assert_eq!(vendor_info(0x10EC).map(|v| v.name), Some("Realtek Semiconductor Co., Ltd."));
    }

    #[test]
    fn test_class_name_falls_back_to_base() {
        assert_eq!(class_name(0x06, 0x04), "PCI-to-PCI Bridge");
        assert_eq!(class_name(0x0C, 0x03), "USB Controller");
        assert_eq!(class_name(0x0C, 0x07), "Serial Bus");
        assert_eq!(class_name(0x42, 0x00), "Unknown");
    }
}
