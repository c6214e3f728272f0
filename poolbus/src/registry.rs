//! Device registry
//!
//! Maps a bus address to the device object that consumes its frames.
//! Populated while configuring the bus, then shared read-only with the
//! reader loop.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use poolbus_core::Frame;
use poolbus_types::Address;

use crate::error::{Error, Result};

/// Inbound side of a logical device
///
/// Called on the reader task for every frame whose source is the device's
/// address. Must return quickly: the next frame is not read until it does.
pub trait DeviceSink: Send + Sync {
    fn on_frame(&self, frame: &Frame);
}

impl<F> DeviceSink for F
where
    F: Fn(&Frame) + Send + Sync,
{
    fn on_frame(&self, frame: &Frame) {
        self(frame)
    }
}

/// Address to device mapping
#[derive(Clone, Default)]
pub struct DeviceRegistry {
    devices: HashMap<Address, Arc<dyn DeviceSink>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Register a device
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDevice`] if the address is taken.
    pub fn register(
        &mut self,
        address: impl Into<Address>,
        device: impl DeviceSink + 'static,
    ) -> Result<()> {
        let address = address.into();
        if self.devices.contains_key(&address) {
            return Err(Error::DuplicateDevice(address));
        }
        
        self.devices.insert(address, Arc::new(device));
        Ok(())
    }
    
    /// Registered device for an address
    pub fn get(&self, address: Address) -> Option<&Arc<dyn DeviceSink>> {
        self.devices.get(&address)
    }
    
    pub fn contains(&self, address: Address) -> bool {
        self.devices.contains_key(&address)
    }
    
    pub fn len(&self) -> usize {
        self.devices.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
    
    /// Registered addresses in ascending order
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.devices.keys().copied().collect();
        addresses.sort();
        addresses
    }
}

impl fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("addresses", &self.addresses())
            .finish()
    }
}
