//! Pull-based reader over buffered input
//!
//! The cursor never consumes a partial read: `next_n` either fills the whole
//! buffer or leaves the position untouched. Running dry is reported as
//! [`Error::NeedMore`] while the source may still deliver bytes, and as
//! [`Error::StreamClosed`] once the owner has marked the source exhausted.

use crate::error::{Error, Result};

/// Cursor over the bytes currently buffered from the bus
#[derive(Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    closed: bool,
}

impl<'a> ByteCursor<'a> {
    /// Cursor over a live source that may deliver more bytes later
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            closed: false,
        }
    }
    
    /// Cursor over the final bytes of a source that has closed
    pub fn closed(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            closed: true,
        }
    }
    
    /// Read one byte
    pub fn next_byte(&mut self) -> Result<u8> {
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => Err(self.underrun()),
        }
    }
    
    /// Fill `buf` completely or consume nothing
    pub fn next_n(&mut self, buf: &mut [u8]) -> Result<()> {
        let end = self.pos + buf.len();
        if end > self.data.len() {
            return Err(self.underrun());
        }
        
        buf.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }
    
    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }
    
    /// Move back to an earlier position
    ///
    /// Positions past the current one are ignored.
    pub fn rewind_to(&mut self, pos: usize) {
        if pos <= self.pos {
            self.pos = pos;
        }
    }
    
    fn underrun(&self) -> Error {
        if self.closed {
            Error::StreamClosed
        } else {
            Error::NeedMore
        }
    }
}
