//! Fixed-capacity device registry
//!
//! Storage is reserved up front; there is no allocator this early in boot.
//! Entries keep insertion order, which for a scan is depth-first order.

use heapless::Vec;

use super::Device;
use crate::error::{Error, Result};

/// Number of functions the boot registry can hold
pub const DEVICE_CAPACITY: usize = 32;

/// Ordered list of discovered PCI functions
#[derive(Debug, Clone)]
pub struct DeviceRegistry<const N: usize = DEVICE_CAPACITY> {
    devices: Vec<Device, N>,
}

impl<const N: usize> DeviceRegistry<N> {
    pub const fn new() -> Self {
        Self { devices: Vec::new() }
    }

    /// Append a device. Fails with [`Error::Full`] once `N` entries are held;
    /// existing entries are never touched.
    pub fn add(&mut self, device: Device) -> Result<()> {
        self.devices.push(device).map_err(|_| Error::Full)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Alias of [`len`](Self::len)
    pub fn count(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.devices.len() == N
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn get(&self, index: usize) -> Device {
        self.devices[index]
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Device> {
        self.devices.iter()
    }

    pub fn as_slice(&self) -> &[Device] {
        &self.devices
    }

    /// First device, in scan order, matching `predicate`
    pub fn find<P>(&self, mut predicate: P) -> Option<Device>
    where
        P: FnMut(&Device) -> bool,
    {
        self.devices.iter().find(|device| predicate(device)).copied()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }
}

impl<const N: usize> Default for DeviceRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> IntoIterator for &'a DeviceRegistry<N> {
    type Item = &'a Device;
    type IntoIter = core::slice::Iter<'a, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
