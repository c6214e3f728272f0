//! Outbound messages

use std::fmt;

use bytes::Bytes;

/// Command to be written on the primary bus
///
/// Carries no source address: the writer always stamps the local node's
/// own address.
///
/// # Examples
///
/// ```
/// use poolbus_core::{Message, constants::actions};
///
/// let request = Message::new(0x60, actions::PUMP_STATUS);
/// assert!(request.payload.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Target address; the high byte travels in the header's second byte
    pub destination: u16,
    
    /// Action code
    pub action: u8,
    
    /// Payload bytes, at most 34
    pub payload: Bytes,
}

impl Message {
    /// Create a message with empty payload
    pub fn new(destination: u16, action: u8) -> Self {
        Self {
            destination,
            action,
            payload: Bytes::new(),
        }
    }
    
    /// Create a message with payload
    pub fn with_payload(destination: u16, action: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            destination,
            action,
            payload: payload.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message(dst=0x{:02X}, action=0x{:02X}, len={})",
            self.destination,
            self.action,
            self.payload.len()
        )
    }
}
