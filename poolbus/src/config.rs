//! Bus configuration

use std::ops::RangeInclusive;

use poolbus_core::UnderrunPolicy;
use poolbus_types::Address;

use crate::error::Result;

/// Settings for one bus connection
#[derive(Debug, Clone)]
pub struct BusConfig {
    own_address: u8,
    underrun_policy: UnderrunPolicy,
    panel_range: RangeInclusive<Address>,
    read_chunk: usize,
}

impl BusConfig {
    /// Address this node writes as, a free wireless-remote slot
    pub const DEFAULT_OWN_ADDRESS: u8 = 0x21;
    
    /// Bytes requested per transport read
    pub const DEFAULT_READ_CHUNK: usize = 1024;
    
    pub fn new(own_address: u8) -> Self {
        Self {
            own_address,
            underrun_policy: UnderrunPolicy::default(),
            panel_range: Address::CONTROL_PANELS,
            read_chunk: Self::DEFAULT_READ_CHUNK,
        }
    }
    
    /// Build from a configured address
    ///
    /// # Errors
    ///
    /// Fails for addresses outside the one-byte primary range.
    pub fn for_address(address: Address) -> Result<Self> {
        Ok(Self::new(address.as_primary()?))
    }
    
    /// Set what happens to a frame cut off at the end of a read
    pub fn with_underrun_policy(mut self, policy: UnderrunPolicy) -> Self {
        self.underrun_policy = policy;
        self
    }
    
    /// Set the sources treated as control panels
    ///
    /// Unregistered control panels are expected on the bus and logged
    /// without warnings.
    pub fn with_panel_range(mut self, range: RangeInclusive<Address>) -> Self {
        self.panel_range = range;
        self
    }
    
    /// Set the read size, at least one byte
    pub fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk.max(1);
        self
    }
    
    pub fn own_address(&self) -> u8 {
        self.own_address
    }
    
    pub fn underrun_policy(&self) -> UnderrunPolicy {
        self.underrun_policy
    }
    
    pub fn panel_range(&self) -> &RangeInclusive<Address> {
        &self.panel_range
    }
    
    pub fn read_chunk(&self) -> usize {
        self.read_chunk
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_OWN_ADDRESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    
    #[test]
    fn test_defaults() {
        let config = BusConfig::default();
        assert_eq!(config.own_address(), 0x21);
        assert_eq!(config.underrun_policy(), UnderrunPolicy::Retain);
        assert!(config.panel_range().contains(&Address::new(0x20)));
        assert!(config.panel_range().contains(&Address::new(0x2F)));
        assert!(!config.panel_range().contains(&Address::CONTROLLER));
        assert_eq!(config.read_chunk(), 1024);
    }
    
    #[test]
    fn test_builder() {
        let config = BusConfig::new(0x22)
            .with_underrun_policy(UnderrunPolicy::Discard)
            .with_panel_range(Address::CONTROLLER..=Address::new(0x22))
            .with_read_chunk(0);
        
        assert_eq!(config.underrun_policy(), UnderrunPolicy::Discard);
        assert!(config.panel_range().contains(&Address::CONTROLLER));
        assert!(!config.panel_range().contains(&Address::new(0x23)));
        assert_eq!(config.read_chunk(), 1);
    }
    
    #[test]
    fn test_for_address() {
        let address: Address = "0x22".parse().unwrap();
        assert_eq!(BusConfig::for_address(address).unwrap().own_address(), 0x22);
        
        assert!(matches!(
            BusConfig::for_address(Address::AUXILIARY_SOURCE),
            Err(Error::Types(_))
        ));
    }
}
