//! Frame routing
//!
//! Every verified frame is handed to the device registered under its
//! source address. Frames from unregistered sources are logged once at
//! warn level and then at trace level, except for control panels, which
//! are expected to talk without a registered handler.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Arc;

use poolbus_core::Frame;
use poolbus_types::Address;
use tracing::{trace, warn};

use crate::registry::DeviceRegistry;

/// Outcome of dispatching one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to a registered device
    Delivered,
    
    /// Unregistered control panel source
    ControlPanel,
    
    /// Unregistered source seen for the first time on this connection
    FirstUnknown,
    
    /// Unregistered source already reported
    RepeatUnknown,
}

/// Sources seen without a registered device
///
/// Only used to keep the warning for each address to one per connection.
#[derive(Debug, Default)]
pub struct UnregisteredSourceTracker {
    seen: HashSet<Address>,
}

impl UnregisteredSourceTracker {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Record a sighting; true the first time an address is seen
    pub fn observe(&mut self, address: Address) -> bool {
        self.seen.insert(address)
    }
    
    pub fn contains(&self, address: Address) -> bool {
        self.seen.contains(&address)
    }
    
    pub fn len(&self) -> usize {
        self.seen.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
    
    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

/// Routes frames to registered devices
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<DeviceRegistry>,
    panels: RangeInclusive<Address>,
    unregistered: UnregisteredSourceTracker,
}

impl Dispatcher {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self {
            registry,
            panels: Address::CONTROL_PANELS,
            unregistered: UnregisteredSourceTracker::new(),
        }
    }
    
    /// Set the sources treated as control panels
    pub fn with_panel_range(mut self, panels: RangeInclusive<Address>) -> Self {
        self.panels = panels;
        self
    }
    
    /// Route one frame
    pub fn dispatch(&mut self, frame: &Frame) -> Delivery {
        let source = Address::new(frame.source());
        
        if let Some(device) = self.registry.get(source) {
            trace!(%source, %frame, "Delivering frame");
            device.on_frame(frame);
            return Delivery::Delivered;
        }
        
        if frame.is_primary() && self.panels.contains(&source) {
            trace!(%source, %frame, "Control panel frame");
            return Delivery::ControlPanel;
        }
        
        if self.unregistered.observe(source) {
            warn!(
                %source,
                action = format!("0x{:02X}", frame.action()),
                "Frame from unregistered source"
            );
            Delivery::FirstUnknown
        } else {
            trace!(%source, %frame, "Frame from unregistered source");
            Delivery::RepeatUnknown
        }
    }
    
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }
    
    pub fn unregistered(&self) -> &UnregisteredSourceTracker {
        &self.unregistered
    }
    
    /// Forget reported sources, as on a fresh connection
    pub fn reset(&mut self) {
        self.unregistered.clear();
    }
}
