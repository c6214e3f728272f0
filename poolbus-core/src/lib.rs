//! # poolbus-core
//!
//! Frame codec for RS-485 pool equipment buses.
//!
//! Two framing grammars share the wire:
//! - Primary device bus frames (`FF 00 FF A5 ..`, 16-bit checksum)
//! - Auxiliary chlorinator frames (`10 02 .. 10 03`, 8-bit checksum)
//!
//! This crate provides the low-level primitives:
//! - Checksum calculation
//! - Byte cursor and frame scanner state machine
//! - Buffered decoding across reads
//! - Outbound frame encoding
//!
//! ## Partial frames
//!
//! A frame cut off at the end of a transport read is kept and completed by
//! the next read ([`UnderrunPolicy::Retain`], the default). Older bindings
//! dropped such frames; [`UnderrunPolicy::Discard`] restores that behaviour
//! for callers that depend on it.

pub mod checksum;
pub mod constants;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod message;
pub mod scanner;
pub mod writer;

pub use cursor::ByteCursor;
pub use decoder::{FrameDecoder, UnderrunPolicy};
pub use error::{Error, Result};
pub use frame::{Frame, Protocol};
pub use message::Message;
pub use scanner::{FrameScanner, ScanState, ScanStats};
