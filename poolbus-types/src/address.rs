//! Bus addresses
//!
//! Primary bus participants use one-byte addresses. The chlorinator
//! sub-protocol carries no source address on the wire, so its frames are
//! attributed to a sentinel outside the one-byte range.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Address of a bus participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(u16);

impl Address {
    /// Broadcast destination used by the controller for status frames
    pub const BROADCAST: Address = Address(0x0F);
    
    /// Main pool controller
    pub const CONTROLLER: Address = Address(0x10);
    
    /// Chlorinator (destination byte inside auxiliary frames)
    pub const CHLORINATOR: Address = Address(0x50);
    
    /// First variable speed pump; pumps occupy 0x60..=0x6F
    pub const PUMP_1: Address = Address(0x60);
    
    /// Sentinel source assigned to every auxiliary (chlorinator) frame
    pub const AUXILIARY_SOURCE: Address = Address(0x0100);
    
    /// Wired and wireless control panels (high nibble `0x2`)
    ///
    /// The main controller at `0x10` is not a panel.
    pub const CONTROL_PANELS: RangeInclusive<Address> = Address(0x20)..=Address(0x2F);
    
    pub const fn new(value: u16) -> Self {
        Self(value)
    }
    
    /// Raw numeric value
    pub const fn value(self) -> u16 {
        self.0
    }
    
    /// Check if the address fits the one-byte primary address space
    pub const fn is_primary(self) -> bool {
        self.0 <= 0xFF
    }
    
    /// Narrow to a one-byte primary address
    ///
    /// # Errors
    ///
    /// Returns a validation error for sentinel addresses above `0xFF`.
    pub fn as_primary(self) -> Result<u8> {
        u8::try_from(self.0)
            .map_err(|_| Error::Validation(format!("{} is not a one-byte bus address", self)))
    }
}

impl From<u8> for Address {
    fn from(value: u8) -> Self {
        Self(value as u16)
    }
}

impl From<u16> for Address {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Address> for u16 {
    fn from(addr: Address) -> u16 {
        addr.0
    }
}

impl FromStr for Address {
    type Err = Error;
    
    /// Parse decimal (`96`) or hex (`0x60`) notation
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => s.parse::<u16>(),
        };
        
        parsed
            .map(Self)
            .map_err(|e| Error::Parse(format!("invalid address {:?}: {}", s, e)))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_primary() {
            write!(f, "0x{:02X}", self.0)
        } else {
            write!(f, "0x{:04X}", self.0)
        }
    }
}
