//! Transport over an already opened byte stream
//!
//! Lets applications hand in any async stream they opened themselves, such
//! as a serial port, or a pair of halves in tests.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::{Transport, connection::Connection, error::*};

/// Transport wrapping a stream supplied by the caller
///
/// The stream can be opened once; a dead stream cannot be reopened, so
/// later calls to [`Transport::open`] fail with [`Error::StreamTaken`].
pub struct StreamTransport {
    name: String,
    conn: Option<Connection>,
}

impl StreamTransport {
    /// Wrap a bidirectional stream
    pub fn new<S>(stream: S, name: impl Into<String>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read, write) = tokio::io::split(stream);
        Self::from_halves(read, write, name)
    }
    
    /// Wrap separate read and write halves
    pub fn from_halves(
        read: impl AsyncRead + Send + Unpin + 'static,
        write: impl AsyncWrite + Send + Unpin + 'static,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            conn: Some(Connection::new(read, write, name.clone())),
            name,
        }
    }
    
    pub fn is_taken(&self) -> bool {
        self.conn.is_none()
    }
}

#[async_trait]
impl Transport for StreamTransport {
    async fn open(&mut self) -> Result<Connection> {
        let conn = self.conn.take().ok_or(Error::StreamTaken)?;
        debug!("Opened stream {}", self.name);
        Ok(conn)
    }
    
    fn remote_addr(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use tokio::io::AsyncWriteExt;
    
    #[tokio::test]
    async fn test_open_once() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(client, "duplex");
        
        let mut conn = transport.open().await.unwrap();
        assert!(transport.is_taken());
        assert_eq!(transport.remote_addr(), "duplex");
        
        server.write_all(&[0x10]).await.unwrap();
        let mut buf = BytesMut::new();
        conn.reader.receive(&mut buf).await.unwrap();
        assert_eq!(buf.as_ref(), &[0x10]);
        
        assert!(matches!(transport.open().await, Err(Error::StreamTaken)));
    }
}
