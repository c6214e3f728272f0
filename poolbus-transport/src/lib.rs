//! Transport layer for poolbus
//!
//! Provides the byte source and sink the frame codec runs on. A transport
//! is constructed first and then opened into a [`Connection`], whose read
//! and write halves are owned by different tasks: the reader loop owns the
//! read half, writers share the write half behind a lock.

pub mod connection;
pub mod error;
pub mod stream;
pub mod tcp;

pub use connection::{ByteReader, ByteWriter, Connection};
pub use error::{Error, Result};
pub use stream::StreamTransport;
pub use tcp::TcpTransport;

use async_trait::async_trait;

/// Transport trait for different bus attachments
#[async_trait]
pub trait Transport: Send {
    /// Open a connection to the bus
    async fn open(&mut self) -> Result<Connection>;
    
    /// Get remote address
    fn remote_addr(&self) -> String;
}
