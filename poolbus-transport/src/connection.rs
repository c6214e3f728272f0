//! Split connection halves

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};

type BoxedRead = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWrite = Box<dyn AsyncWrite + Send + Unpin>;

/// An open bus connection
pub struct Connection {
    pub reader: ByteReader,
    pub writer: ByteWriter,
    
    /// Peer description for logging and status reporting
    pub remote: String,
}

impl Connection {
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
        remote: impl Into<String>,
    ) -> Self {
        Self {
            reader: ByteReader::new(reader),
            writer: ByteWriter::new(writer),
            remote: remote.into(),
        }
    }
    
    /// Set read timeout on the read half
    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.reader.read_timeout = read_timeout;
        self
    }
}

/// Read half of a connection
pub struct ByteReader {
    inner: BoxedRead,
    read_timeout: Option<Duration>,
}

impl ByteReader {
    pub fn new(inner: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            read_timeout: None,
        }
    }
    
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }
    
    /// Receive whatever bytes are available, appending to `buf`
    ///
    /// Waits for at least one byte.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] when the peer closed the stream
    /// - [`Error::ReadTimeout`] when nothing arrived within the read timeout
    pub async fn receive(&mut self, buf: &mut BytesMut) -> Result<usize> {
        let start = buf.len();
        
        let n = match self.read_timeout {
            Some(limit) => timeout(limit, self.inner.read_buf(buf))
                .await
                .map_err(|_| Error::ReadTimeout)??,
            None => self.inner.read_buf(buf).await?,
        };
        
        if n == 0 {
            debug!("Read returned end of stream");
            return Err(Error::ConnectionClosed);
        }
        
        trace!("Received {} bytes: {:02X?}", n, &buf[start..start + n.min(32)]);
        
        Ok(n)
    }
}

/// Write half of a connection
pub struct ByteWriter {
    inner: Option<BoxedWrite>,
}

impl ByteWriter {
    pub fn new(inner: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            inner: Some(Box::new(inner)),
        }
    }
    
    /// Write all bytes and flush
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        let inner = self.inner.as_mut().ok_or(Error::NotConnected)?;
        
        trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(32)]);
        
        inner.write_all(data).await?;
        inner.flush().await?;
        
        Ok(())
    }
    
    /// Shut the write half down; later sends fail with `NotConnected`
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(mut inner) = self.inner.take() {
            inner.shutdown().await?;
        }
        
        Ok(())
    }
    
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[tokio::test]
    async fn test_receive_appends() {
        let (client, mut server) = tokio::io::duplex(64);
        let (read, _write) = tokio::io::split(client);
        let mut reader = ByteReader::new(read);
        
        server.write_all(&[0xFF, 0x00]).await.unwrap();
        
        let mut buf = BytesMut::from(&[0x42][..]);
        let n = reader.receive(&mut buf).await.unwrap();
        
        assert_eq!(n, 2);
        assert_eq!(buf.as_ref(), &[0x42, 0xFF, 0x00]);
    }
    
    #[tokio::test]
    async fn test_receive_reports_closed() {
        let (client, server) = tokio::io::duplex(64);
        let mut reader = ByteReader::new(client);
        drop(server);
        
        let mut buf = BytesMut::with_capacity(16);
        assert!(matches!(
            reader.receive(&mut buf).await,
            Err(Error::ConnectionClosed)
        ));
    }
    
    #[tokio::test(start_paused = true)]
    async fn test_receive_times_out() {
        let (client, _server) = tokio::io::duplex(64);
        let conn = Connection::new(client, tokio::io::sink(), "test")
            .with_read_timeout(Some(Duration::from_secs(1)));
        let mut reader = conn.reader;
        
        let mut buf = BytesMut::with_capacity(16);
        assert!(matches!(
            reader.receive(&mut buf).await,
            Err(Error::ReadTimeout)
        ));
    }
    
    #[tokio::test]
    async fn test_send_then_shutdown() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut writer = ByteWriter::new(client);
        
        writer.send(&[0x10, 0x02]).await.unwrap();
        let mut buf = [0u8; 2];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0x10, 0x02]);
        
        writer.shutdown().await.unwrap();
        assert!(!writer.is_open());
        assert!(matches!(writer.send(&[0x00]).await, Err(Error::NotConnected)));
    }
}
