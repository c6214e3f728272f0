//! Parsed bus frames
//!
//! A [`Frame`] only exists after its checksum has been verified; the
//! constructors are private to this crate and only the scanner calls them.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;

use crate::constants::{PRIMARY_HEADER_SIZE, auxiliary, header};

/// Which framing grammar produced a frame
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// `FF..FF 00 FF A5 ..` device bus frames
    Primary,
    
    /// `10 02 .. 10 03` chlorinator frames
    Auxiliary,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Auxiliary => write!(f, "auxiliary"),
        }
    }
}

/// Checksum-verified bus frame
///
/// # Primary layout
///
/// ```text
/// ┌────────┬─────────┬──────┬────────┬────────┬────────┬───────────┐
/// │ Marker │ Dest Hi │ Dest │ Source │ Action │ Length │  Payload  │
/// │  0xA5  │ 1 byte  │  1   │   1    │   1    │   1    │ 0..=34    │
/// └────────┴─────────┴──────┴────────┴────────┴────────┴───────────┘
/// ```
///
/// # Auxiliary layout
///
/// ```text
/// ┌──────┬────────┬──────┬────────┬──────────────┐
/// │ 0x10 │  0x02  │ Dest │ Action │ Payload 1..2 │
/// └──────┴────────┴──────┴────────┴──────────────┘
/// ```
///
/// `raw` holds exactly these bytes (preamble, checksum and trailer
/// excluded).
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    protocol: Protocol,
    source: u16,
    destination: u16,
    action: u8,
    payload: Bytes,
    raw: Bytes,
    checksum: u16,
}

impl Frame {
    /// Build a primary frame from verified header + payload bytes
    pub(crate) fn primary(raw: Bytes, checksum: u16) -> Self {
        debug_assert!(raw.len() >= PRIMARY_HEADER_SIZE);
        
        Self {
            protocol: Protocol::Primary,
            source: raw[header::SOURCE] as u16,
            destination: BigEndian::read_u16(&raw[header::DEST_HI..=header::DEST]),
            action: raw[header::ACTION],
            payload: raw.slice(PRIMARY_HEADER_SIZE..),
            raw,
            checksum,
        }
    }
    
    /// Build an auxiliary frame from verified `10 02 <body>` bytes
    pub(crate) fn auxiliary(raw: Bytes, checksum: u8) -> Self {
        debug_assert!(raw.len() >= 2 + auxiliary::SHORT_BODY);
        
        Self {
            protocol: Protocol::Auxiliary,
            source: auxiliary::SOURCE,
            destination: raw[2] as u16,
            action: raw[3],
            payload: raw.slice(4..),
            raw,
            checksum: checksum as u16,
        }
    }
    
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
    
    /// Originating address (the auxiliary sentinel for chlorinator frames)
    pub fn source(&self) -> u16 {
        self.source
    }
    
    pub fn destination(&self) -> u16 {
        self.destination
    }
    
    pub fn action(&self) -> u8 {
        self.action
    }
    
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
    
    /// Bytes as received, checksum excluded
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }
    
    /// Checksum carried on the wire (low byte only for auxiliary frames)
    pub fn checksum(&self) -> u16 {
        self.checksum
    }
    
    pub fn is_primary(&self) -> bool {
        self.protocol == Protocol::Primary
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("protocol", &self.protocol)
            .field("source", &format!("0x{:02X}", self.source))
            .field("destination", &format!("0x{:02X}", self.destination))
            .field("action", &format!("0x{:02X}", self.action))
            .field("checksum", &format!("0x{:04X}", self.checksum))
            .field("payload", &hex::encode(&self.payload))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame[{}](src=0x{:02X}, dst=0x{:02X}, action=0x{:02X}, len={})",
            self.protocol,
            self.source,
            self.destination,
            self.action,
            self.payload.len()
        )
    }
}
