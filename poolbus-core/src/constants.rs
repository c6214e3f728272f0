//! Protocol constants

/// Preamble filler byte; a run of one or more starts a primary frame
pub const PREAMBLE_FILL: u8 = 0xFF;

/// Byte that ends the filler run of a primary preamble
pub const PREAMBLE_SYNC: u8 = 0x00;

/// Preamble emitted in front of every outbound primary frame
pub const PRIMARY_PREAMBLE: [u8; 5] = [0xFF, 0xFF, 0xFF, 0x00, 0xFF];

/// First header byte of every primary frame
pub const PRIMARY_MARKER: u8 = 0xA5;

/// Primary header: marker, dest_hi, dest, source, action, length
pub const PRIMARY_HEADER_SIZE: usize = 6;

/// Largest payload a primary frame may declare
pub const MAX_PAYLOAD_SIZE: usize = 34;

/// Primary checksum width on the wire (big-endian)
pub const PRIMARY_CHECKSUM_SIZE: usize = 2;

/// Header field offsets inside the six primary header bytes
pub mod header {
    pub const MARKER: usize = 0;
    pub const DEST_HI: usize = 1;
    pub const DEST: usize = 2;
    pub const SOURCE: usize = 3;
    pub const ACTION: usize = 4;
    pub const LENGTH: usize = 5;
}

/// Auxiliary (chlorinator) framing
pub mod auxiliary {
    /// Start byte; consumed as sync but part of the checksum
    pub const START: u8 = 0x10;
    
    /// Marker following the start byte
    pub const MARKER: u8 = 0x02;
    
    /// Trailer closing every auxiliary frame
    pub const TRAILER: [u8; 2] = [0x10, 0x03];
    
    /// Body sizes, probed shortest first
    pub const SHORT_BODY: usize = 3;
    pub const LONG_BODY: usize = 4;
    
    /// Source reported for auxiliary frames (no source byte on the wire)
    pub const SOURCE: u16 = 0x0100;
}

/// Common action codes seen on the primary bus
pub mod actions {
    /// Controller status broadcast
    pub const CONTROLLER_STATUS: u8 = 0x02;
    
    /// Pump remote/local control
    pub const PUMP_REMOTE_CONTROL: u8 = 0x04;
    
    /// Pump run mode
    pub const PUMP_MODE: u8 = 0x05;
    
    /// Pump power on/off
    pub const PUMP_POWER: u8 = 0x06;
    
    /// Pump status request / response
    pub const PUMP_STATUS: u8 = 0x07;
}
