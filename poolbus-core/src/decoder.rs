//! Buffered frame decoding across reads
//!
//! [`FrameDecoder`] owns the bytes a [`ByteCursor`] walks over. Each chunk
//! from the transport is appended and scanned; what happens to a frame
//! that is cut off at the end of a chunk depends on the
//! [`UnderrunPolicy`].

use bytes::{Buf, BytesMut};
use tracing::{trace, warn};

use crate::{
    cursor::ByteCursor,
    error::Result,
    frame::Frame,
    scanner::{FrameScanner, ScanStats},
};

/// Upper bound on bytes retained for an unfinished frame attempt
///
/// A valid attempt is a preamble run plus at most 49 bytes; anything
/// larger is a runaway `FF` run.
pub const MAX_RETAINED: usize = 4096;

/// What to do with an incomplete frame when input runs dry
///
/// The default is [`UnderrunPolicy::Retain`]. Older bus bindings dropped
/// a frame attempt whenever the buffered input ran out mid-frame, which
/// loses any frame a transport read happens to split. Select
/// [`UnderrunPolicy::Discard`] to keep that behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnderrunPolicy {
    /// Keep the bytes and rescan them once more data arrives
    #[default]
    Retain,
    
    /// Drop them; a frame split across reads is lost
    Discard,
}

/// Frame decoder over a growing byte buffer
///
/// # Examples
///
/// ```
/// use poolbus_core::FrameDecoder;
///
/// let wire = [0xFF, 0x00, 0xFF, 0xA5, 0x00, 0x60, 0x10, 0x07, 0x00, 0x01, 0x1C];
/// let mut decoder = FrameDecoder::new();
///
/// // First half: nothing yet
/// assert!(decoder.decode(&wire[..5]).unwrap().is_empty());
///
/// // Second half completes the frame
/// let frames = decoder.decode(&wire[5..]).unwrap();
/// assert_eq!(frames.len(), 1);
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    scanner: FrameScanner,
    policy: UnderrunPolicy,
    closed: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_policy(UnderrunPolicy::default())
    }
    
    pub fn with_policy(policy: UnderrunPolicy) -> Self {
        Self {
            buf: BytesMut::with_capacity(1024),
            scanner: FrameScanner::new(),
            policy,
            closed: false,
        }
    }
    
    pub fn policy(&self) -> UnderrunPolicy {
        self.policy
    }
    
    /// Append bytes read from the bus
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }
    
    /// Mark the source exhausted; the buffered tail is still scanned
    pub fn close(&mut self) {
        self.closed = true;
    }
    
    /// Extract the next frame from buffered bytes
    ///
    /// `Ok(None)` means more input is needed.
    ///
    /// # Errors
    ///
    /// [`crate::Error::StreamClosed`] once [`close`](Self::close) was called
    /// and the buffered bytes are used up.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let (result, consumed) = {
            let mut cursor = if self.closed {
                ByteCursor::closed(&self.buf)
            } else {
                ByteCursor::new(&self.buf)
            };
            let result = self.scanner.scan(&mut cursor);
            (result, cursor.position())
        };
        
        match result {
            Ok(Some(frame)) => {
                self.buf.advance(consumed);
                Ok(Some(frame))
            }
            Ok(None) => {
                self.buf.advance(consumed);
                self.settle_underrun();
                Ok(None)
            }
            Err(e) => {
                self.buf.clear();
                Err(e)
            }
        }
    }
    
    /// Append a chunk and drain every complete frame
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.push(data);
        
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        
        Ok(frames)
    }
    
    /// Bytes held for an unfinished frame attempt
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
    
    pub fn stats(&self) -> ScanStats {
        self.scanner.stats()
    }
    
    /// Drop buffered bytes, counters and the closed flag
    pub fn reset(&mut self) {
        self.buf.clear();
        self.scanner.reset();
        self.closed = false;
    }
    
    fn settle_underrun(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        
        match self.policy {
            UnderrunPolicy::Retain if self.buf.len() <= MAX_RETAINED => {
                trace!(pending = self.buf.len(), "Holding partial frame for next read");
            }
            UnderrunPolicy::Retain => {
                warn!(pending = self.buf.len(), "Dropping runaway partial frame");
                self.buf.clear();
            }
            UnderrunPolicy::Discard => {
                trace!(dropped = self.buf.len(), "Dropping partial frame");
                self.buf.clear();
            }
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
