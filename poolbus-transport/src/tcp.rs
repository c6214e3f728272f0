//! TCP transport 
//!
//! Reaches the bus through an RS-485 to Ethernet adapter (or a ser2net
//! style bridge) that passes raw bus bytes over a TCP stream.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::{Transport, connection::Connection, error::*};

/// TCP transport for network-attached bus adapters
pub struct TcpTransport {
    addr: String,
    port: u16,
    socket_addr: Option<SocketAddr>,
    connect_timeout: Duration,
    read_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Create new TCP transport
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            socket_addr: None,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Some(Duration::from_secs(30)),
        }
    }
    
    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
    
    /// Set read timeout
    ///
    /// A bus with a running controller is never silent for long, so a read
    /// timeout is treated as a lost connection. `None` waits forever.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }
    
    /// Resolve address to SocketAddr
    async fn resolve_addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.socket_addr {
            return Ok(addr);
        }
        
        let addr_str = format!("{}:{}", self.addr, self.port);
        
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr_str, e)))?
            .collect();
        
        let addr = addrs
            .first()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", addr_str)))?;
        
        self.socket_addr = Some(*addr);
        Ok(*addr)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(&mut self) -> Result<Connection> {
        let addr = self.resolve_addr().await?;
        
        debug!("Connecting to {}...", addr);
        
        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout)?
            .map_err(Error::Io)?;
        
        // Bus frames are small; don't let Nagle hold them back
        stream.set_nodelay(true)?;
        
        debug!("Connected to {}", addr);
        
        let (read, write) = stream.into_split();
        Ok(Connection::new(read, write, addr.to_string()).with_read_timeout(self.read_timeout))
    }
    
    fn remote_addr(&self) -> String {
        self.socket_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.addr, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    
    #[tokio::test]
    async fn test_tcp_transport_create() {
        let transport = TcpTransport::new("192.168.1.201", 9801);
        assert_eq!(transport.remote_addr(), "192.168.1.201:9801");
    }
    
    #[tokio::test]
    async fn test_tcp_transport_invalid_address() {
        let mut transport = TcpTransport::new("invalid..address", 9801)
            .with_connect_timeout(Duration::from_millis(100));
        
        let result = transport.open().await;
        assert!(result.is_err());
    }
    
    #[tokio::test]
    async fn test_tcp_transport_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(&[0xFF, 0x00, 0xFF]).await.unwrap();
            
            let mut buf = [0u8; 2];
            socket.read_exact(&mut buf).await.unwrap();
            buf
        });
        
        let mut transport = TcpTransport::new("127.0.0.1", port);
        let mut conn = transport.open().await.unwrap();
        assert_eq!(conn.remote, format!("127.0.0.1:{}", port));
        
        let mut buf = BytesMut::with_capacity(16);
        while buf.len() < 3 {
            conn.reader.receive(&mut buf).await.unwrap();
        }
        assert_eq!(buf.as_ref(), &[0xFF, 0x00, 0xFF]);
        
        conn.writer.send(&[0x10, 0x02]).await.unwrap();
        assert_eq!(server.await.unwrap(), [0x10, 0x02]);
    }
}
