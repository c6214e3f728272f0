//! Error types for poolbus-core

/// Result type alias for poolbus-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Buffered input ran out before the current item was complete
    ///
    /// Not a failure: the rest of the frame has not arrived yet.
    #[error("Need more data")]
    NeedMore,
    
    /// Input source is permanently exhausted
    #[error("Stream closed")]
    StreamClosed,
    
    /// Preamble did not continue the way the protocol requires
    #[error("Bad preamble: expected 0x{expected:02X}, got 0x{actual:02X}")]
    BadPreamble {
        expected: u8,
        actual: u8,
    },
    
    /// Header marker byte is wrong
    #[error("Bad marker: expected 0x{expected:02X}, got 0x{actual:02X}")]
    BadMarker {
        expected: u8,
        actual: u8,
    },
    
    /// Declared payload length cannot be trusted
    #[error("Length out of range: {length} bytes (max: {max} bytes)")]
    LengthOutOfRange {
        length: usize,
        max: usize,
    },
    
    /// Checksum verification failed
    #[error("Checksum mismatch: computed 0x{computed:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        computed: u16,
        received: u16,
    },
    
    /// Auxiliary frame had no `10 03` trailer at either probed position
    #[error("Missing auxiliary trailer: {0}")]
    MissingTrailer(String),
    
    /// Outbound payload does not fit a frame
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },
}

impl Error {
    /// Check if the error only invalidates the current frame attempt
    pub fn is_framing_error(&self) -> bool {
        matches!(
            self,
            Self::BadPreamble { .. }
                | Self::BadMarker { .. }
                | Self::LengthOutOfRange { .. }
                | Self::ChecksumMismatch { .. }
                | Self::MissingTrailer(_)
        )
    }
    
    /// Check if error is recoverable (scanning can simply continue)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NeedMore) || self.is_framing_error()
    }
    
    /// Check if error requires reconnection
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::StreamClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_error_classification() {
        assert!(Error::NeedMore.is_recoverable());
        assert!(!Error::NeedMore.is_framing_error());
        
        let mismatch = Error::ChecksumMismatch { computed: 1, received: 2 };
        assert!(mismatch.is_framing_error());
        assert!(!mismatch.requires_reconnect());
        
        assert!(Error::StreamClosed.requires_reconnect());
        assert!(!Error::StreamClosed.is_recoverable());
    }
}
