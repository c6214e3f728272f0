//! Frame scanner state machine
//!
//! Consumes a [`ByteCursor`] and resynchronises on the unframed bus
//! stream. Both sub-protocols are told apart by the first byte of a frame
//! attempt:
//!
//! ```text
//! AwaitingSync ──FF..FF 00──▶ PrimaryHeader ──FF A5 .. CH CL──▶ Frame
//!      │
//!      └──────10───────────▶ AuxiliaryHeader ──02 .. CK 10 03──▶ Frame
//! ```
//!
//! Framing and checksum failures are logged, counted and skipped; the
//! scanner resumes at the byte after the last one it consumed. When input
//! runs dry mid-frame the attempt is abandoned and the cursor is rewound to
//! where the attempt began, so the owner can decide whether to keep those
//! bytes for the next call.

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

use crate::{
    checksum,
    constants::{
        MAX_PAYLOAD_SIZE, PREAMBLE_FILL, PREAMBLE_SYNC, PRIMARY_CHECKSUM_SIZE,
        PRIMARY_HEADER_SIZE, PRIMARY_MARKER, auxiliary, header,
    },
    cursor::ByteCursor,
    error::{Error, Result},
    frame::Frame,
};

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Hunting for a preamble or auxiliary start byte
    #[default]
    AwaitingSync,
    
    /// `FF..FF 00` seen
    PrimaryHeader,
    
    /// `10` seen
    AuxiliaryHeader,
}

/// Running counters kept by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanStats {
    /// Frames emitted
    pub frames: u64,
    
    /// Frames dropped on checksum mismatch
    pub checksum_errors: u64,
    
    /// Frame attempts dropped on bad preamble, marker, length or trailer
    pub framing_errors: u64,
    
    /// Bytes skipped while hunting for a sync byte
    pub discarded_bytes: u64,
}

/// Bus frame scanner
///
/// # Examples
///
/// ```
/// use poolbus_core::{ByteCursor, FrameScanner};
///
/// let wire = [0xFF, 0x00, 0xFF, 0xA5, 0x00, 0x60, 0x10, 0x07, 0x00, 0x01, 0x1C];
/// let mut scanner = FrameScanner::new();
/// let mut cursor = ByteCursor::new(&wire);
///
/// let frame = scanner.scan(&mut cursor).unwrap().unwrap();
/// assert_eq!(frame.destination(), 0x60);
/// assert_eq!(frame.source(), 0x10);
/// ```
#[derive(Debug, Default)]
pub struct FrameScanner {
    state: ScanState,
    stats: ScanStats,
}

impl FrameScanner {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Current state; `AwaitingSync` between calls
    pub fn state(&self) -> ScanState {
        self.state
    }
    
    pub fn stats(&self) -> ScanStats {
        self.stats
    }
    
    /// Forget state and counters
    pub fn reset(&mut self) {
        self.state = ScanState::AwaitingSync;
        self.stats = ScanStats::default();
    }
    
    /// Scan for the next verified frame
    ///
    /// # Returns
    ///
    /// - `Ok(Some(frame))`: the cursor sits right after the frame
    /// - `Ok(None)`: input ran dry; the cursor sits at the first byte of the
    ///   abandoned attempt and nothing before it can start a frame
    ///
    /// # Errors
    ///
    /// Only [`Error::StreamClosed`] escapes; framing and checksum errors are
    /// handled by resynchronising.
    pub fn scan(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<Frame>> {
        let mut attempt_start = cursor.position();
        
        loop {
            let step = match self.state {
                ScanState::AwaitingSync => self.await_sync(cursor).map(|()| None),
                ScanState::PrimaryHeader => read_primary(cursor).map(Some),
                ScanState::AuxiliaryHeader => read_auxiliary(cursor).map(Some),
            };
            
            match step {
                Ok(Some(frame)) => {
                    self.state = ScanState::AwaitingSync;
                    self.stats.frames += 1;
                    
                    if frame.payload().is_empty() {
                        debug!(%frame, "Zero-length frame");
                    } else {
                        trace!(%frame, "Frame received");
                    }
                    
                    return Ok(Some(frame));
                }
                Ok(None) => {
                    if self.state == ScanState::AwaitingSync {
                        attempt_start = cursor.position();
                    }
                }
                Err(Error::NeedMore) => {
                    trace!(
                        state = ?self.state,
                        pending = cursor.position() - attempt_start,
                        "Input ran dry mid-frame"
                    );
                    
                    self.state = ScanState::AwaitingSync;
                    cursor.rewind_to(attempt_start);
                    return Ok(None);
                }
                Err(e) if e.is_framing_error() => {
                    self.record_failure(&e);
                    self.state = ScanState::AwaitingSync;
                    attempt_start = cursor.position();
                }
                Err(e) => {
                    self.state = ScanState::AwaitingSync;
                    return Err(e);
                }
            }
        }
    }
    
    fn await_sync(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        match cursor.next_byte()? {
            PREAMBLE_FILL => {
                let mut next = cursor.next_byte()?;
                while next == PREAMBLE_FILL {
                    next = cursor.next_byte()?;
                }
                
                if next != PREAMBLE_SYNC {
                    return Err(Error::BadPreamble {
                        expected: PREAMBLE_SYNC,
                        actual: next,
                    });
                }
                
                self.state = ScanState::PrimaryHeader;
            }
            auxiliary::START => {
                self.state = ScanState::AuxiliaryHeader;
            }
            other => {
                trace!("Discarding noise byte 0x{:02X}", other);
                self.stats.discarded_bytes += 1;
            }
        }
        
        Ok(())
    }
    
    fn record_failure(&mut self, error: &Error) {
        match error {
            Error::ChecksumMismatch { .. } => self.stats.checksum_errors += 1,
            _ => self.stats.framing_errors += 1,
        }
        
        debug!(state = ?self.state, "Frame discarded, resynchronising: {}", error);
    }
}

/// Read `FF <header> <payload> <checksum>` after the `FF..FF 00` sync
fn read_primary(cursor: &mut ByteCursor<'_>) -> Result<Frame> {
    let fill = cursor.next_byte()?;
    if fill != PREAMBLE_FILL {
        return Err(Error::BadPreamble {
            expected: PREAMBLE_FILL,
            actual: fill,
        });
    }
    
    let mut head = [0u8; PRIMARY_HEADER_SIZE];
    cursor.next_n(&mut head)?;
    
    if head[header::MARKER] != PRIMARY_MARKER {
        return Err(Error::BadMarker {
            expected: PRIMARY_MARKER,
            actual: head[header::MARKER],
        });
    }
    
    // Length is untrusted past the limit, so its payload is not consumed
    let length = head[header::LENGTH] as usize;
    if length > MAX_PAYLOAD_SIZE {
        return Err(Error::LengthOutOfRange {
            length,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    
    let mut raw = BytesMut::with_capacity(PRIMARY_HEADER_SIZE + length);
    raw.put_slice(&head);
    raw.resize(PRIMARY_HEADER_SIZE + length, 0);
    cursor.next_n(&mut raw[PRIMARY_HEADER_SIZE..])?;
    
    let mut trailer = [0u8; PRIMARY_CHECKSUM_SIZE];
    cursor.next_n(&mut trailer)?;
    
    let received = BigEndian::read_u16(&trailer);
    let computed = checksum::compute(&raw);
    
    if computed != received {
        debug!(raw = %hex::encode(&raw), "Primary checksum mismatch");
        return Err(Error::ChecksumMismatch { computed, received });
    }
    
    Ok(Frame::primary(raw.freeze(), received))
}

/// Read `02 <body[3|4]> <checksum> 10 03` after the `10` sync byte
fn read_auxiliary(cursor: &mut ByteCursor<'_>) -> Result<Frame> {
    let marker = cursor.next_byte()?;
    if marker != auxiliary::MARKER {
        return Err(Error::BadMarker {
            expected: auxiliary::MARKER,
            actual: marker,
        });
    }
    
    // body + checksum + trailer, long variant
    let mut buf = [0u8; auxiliary::LONG_BODY + 3];
    cursor.next_n(&mut buf[..auxiliary::SHORT_BODY + 3])?;
    
    let body_len = if trailer_at(&buf, auxiliary::SHORT_BODY) {
        auxiliary::SHORT_BODY
    } else {
        cursor.next_n(&mut buf[auxiliary::SHORT_BODY + 3..])?;
        
        if !trailer_at(&buf, auxiliary::LONG_BODY) {
            return Err(Error::MissingTrailer(hex::encode(buf)));
        }
        
        auxiliary::LONG_BODY
    };
    
    let mut raw = BytesMut::with_capacity(2 + body_len);
    raw.put_u8(auxiliary::START);
    raw.put_u8(auxiliary::MARKER);
    raw.put_slice(&buf[..body_len]);
    
    let received = buf[body_len];
    let computed = checksum::compute_short(&raw);
    
    if computed != received {
        debug!(raw = %hex::encode(&raw), "Auxiliary checksum mismatch");
        return Err(Error::ChecksumMismatch {
            computed: computed as u16,
            received: received as u16,
        });
    }
    
    Ok(Frame::auxiliary(raw.freeze(), received))
}

/// Check for `10 03` right after a body of `body_len` bytes and its checksum
fn trailer_at(buf: &[u8], body_len: usize) -> bool {
    buf[body_len + 1..body_len + 3] == auxiliary::TRAILER
}
