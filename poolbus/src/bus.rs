//! Bus connection
//!
//! [`Bus`] owns the transport and the device registry. Each call to
//! [`Bus::connect`] opens the transport and splits it into a [`BusReader`],
//! which runs the scanning loop on a single task, and a cloneable
//! [`BusWriter`], which serialises outbound frames behind one lock because
//! the bus is half-duplex.

use std::future::Future;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use poolbus_core::{Frame, FrameDecoder, Message, ScanStats, writer};
use poolbus_transport::{ByteReader, ByteWriter, Connection, TcpTransport, Transport};
use poolbus_types::LinkStatus;

use crate::config::BusConfig;
use crate::dispatcher::{Delivery, Dispatcher};
use crate::error::{Error, Result};
use crate::registry::DeviceRegistry;

/// RS-485 pool bus
///
/// # Examples
///
/// ```no_run
/// use poolbus::{Bus, DeviceRegistry, Frame};
///
/// #[tokio::main]
/// async fn main() -> poolbus::Result<()> {
///     let mut registry = DeviceRegistry::new();
///     registry.register(0x60u8, |frame: &Frame| println!("pump: {}", frame))?;
///
///     let mut bus = Bus::tcp("192.168.1.50", 9801, registry);
///     let (reader, _writer) = bus.connect().await?;
///
///     reader.run().await
/// }
/// ```
pub struct Bus {
    transport: Box<dyn Transport>,
    config: BusConfig,
    registry: Arc<DeviceRegistry>,
    status: Arc<watch::Sender<LinkStatus>>,
}

impl Bus {
    /// Create a bus over any transport
    pub fn new(transport: impl Transport + 'static, registry: DeviceRegistry) -> Self {
        let (status, _) = watch::channel(LinkStatus::default());
        
        Self {
            transport: Box::new(transport),
            config: BusConfig::default(),
            registry: Arc::new(registry),
            status: Arc::new(status),
        }
    }
    
    /// Create a bus reached through a TCP bus adapter
    pub fn tcp(host: impl Into<String>, port: u16, registry: DeviceRegistry) -> Self {
        Self::new(TcpTransport::new(host, port), registry)
    }
    
    /// Set bus configuration
    pub fn with_config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }
    
    pub fn config(&self) -> &BusConfig {
        &self.config
    }
    
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }
    
    /// Subscribe to link status changes
    pub fn status(&self) -> watch::Receiver<LinkStatus> {
        self.status.subscribe()
    }
    
    /// Check if connected
    pub fn is_online(&self) -> bool {
        self.status.borrow().is_online()
    }
    
    /// Open the transport and start a fresh session
    ///
    /// Every connection gets a new decoder and forgets which unregistered
    /// sources were already reported.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the connection cannot be opened; the
    /// link is marked offline.
    pub async fn connect(&mut self) -> Result<(BusReader, BusWriter)> {
        info!("Connecting to {}...", self.transport.remote_addr());
        
        let Connection {
            reader,
            writer,
            remote,
        } = match self.transport.open().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to connect: {}", e);
                self.status.send_replace(LinkStatus::offline(Some(e.to_string())));
                return Err(e.into());
            }
        };
        
        info!("Connected to {}", remote);
        self.status.send_replace(LinkStatus::online(remote));
        
        let dispatcher = Dispatcher::new(self.registry.clone())
            .with_panel_range(self.config.panel_range().clone());
        
        let reader = BusReader {
            reader,
            decoder: FrameDecoder::with_policy(self.config.underrun_policy()),
            dispatcher,
            chunk: BytesMut::with_capacity(self.config.read_chunk()),
            read_chunk: self.config.read_chunk(),
            status: self.status.clone(),
        };
        
        let writer = BusWriter {
            inner: Arc::new(Mutex::new(writer)),
            own_address: self.config.own_address(),
            status: self.status.clone(),
        };
        
        Ok((reader, writer))
    }
}

/// Read side of a bus connection
///
/// Owns the byte source exclusively; run it on one task.
pub struct BusReader {
    reader: ByteReader,
    decoder: FrameDecoder,
    dispatcher: Dispatcher,
    chunk: BytesMut,
    read_chunk: usize,
    status: Arc<watch::Sender<LinkStatus>>,
}

impl BusReader {
    /// Read the next verified frame without dispatching it
    ///
    /// # Errors
    ///
    /// Fails once the stream has closed and its buffered bytes are used
    /// up, or on a transport error.
    pub async fn next_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.decoder.next_frame()? {
                return Ok(frame);
            }
            
            self.fill().await?;
        }
    }
    
    /// Route a frame to its device
    pub fn dispatch(&mut self, frame: &Frame) -> Delivery {
        self.dispatcher.dispatch(frame)
    }
    
    /// Scanner counters for this connection
    pub fn stats(&self) -> ScanStats {
        self.decoder.stats()
    }
    
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
    
    /// Read and dispatch frames until the connection drops
    ///
    /// # Errors
    ///
    /// Always ends in [`Error::ConnectivityLost`]; the link is marked
    /// offline first.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }
    
    /// Read and dispatch frames until the connection drops or `shutdown`
    /// completes
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        
        let result = loop {
            let next = tokio::select! {
                _ = &mut shutdown => None,
                frame = self.next_frame() => Some(frame),
            };
            
            match next {
                Some(Ok(frame)) => {
                    self.dispatcher.dispatch(&frame);
                }
                Some(Err(e)) => break Err(e),
                None => break Ok(()),
            }
        };
        
        let stats = self.decoder.stats();
        debug!(
            frames = stats.frames,
            checksum_errors = stats.checksum_errors,
            framing_errors = stats.framing_errors,
            discarded_bytes = stats.discarded_bytes,
            "Reader stopped"
        );
        
        match result {
            Ok(()) => {
                info!("Reader shut down");
                self.status.send_replace(LinkStatus::offline(None));
                Ok(())
            }
            Err(e) => {
                warn!("Bus connection lost: {}", e);
                self.status.send_replace(LinkStatus::offline(Some(e.to_string())));
                Err(Error::ConnectivityLost(e.to_string()))
            }
        }
    }
    
    async fn fill(&mut self) -> Result<()> {
        self.chunk.clear();
        self.chunk.reserve(self.read_chunk);
        
        match self.reader.receive(&mut self.chunk).await {
            Ok(_) => {
                self.decoder.push(&self.chunk);
                Ok(())
            }
            Err(poolbus_transport::Error::ConnectionClosed) => {
                // Scan what is left; the decoder reports the closed stream
                self.decoder.close();
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Write side of a bus connection
///
/// Clones share one lock, so frames from different tasks never interleave.
#[derive(Clone)]
pub struct BusWriter {
    inner: Arc<Mutex<ByteWriter>>,
    own_address: u8,
    status: Arc<watch::Sender<LinkStatus>>,
}

impl BusWriter {
    /// Address stamped as source on every frame
    pub fn own_address(&self) -> u8 {
        self.own_address
    }
    
    /// Encode and write a primary frame
    ///
    /// # Errors
    ///
    /// - [`Error::Core`] if the message cannot be encoded
    /// - [`Error::ConnectivityLost`] if the write fails; the link is marked
    ///   offline
    pub async fn send(&self, message: &Message) -> Result<()> {
        let wire = writer::encode(message, self.own_address)?;
        debug!(%message, "Sending");
        self.send_raw(&wire).await
    }
    
    /// Encode and write an auxiliary (chlorinator) frame
    pub async fn send_auxiliary(&self, destination: u8, action: u8, data: &[u8]) -> Result<()> {
        let wire = writer::encode_auxiliary(destination, action, data)?;
        debug!(
            destination = format!("0x{:02X}", destination),
            action = format!("0x{:02X}", action),
            "Sending auxiliary frame"
        );
        self.send_raw(&wire).await
    }
    
    /// Shut down the write half
    pub async fn close(&self) -> Result<()> {
        self.inner.lock().await.shutdown().await?;
        Ok(())
    }
    
    async fn send_raw(&self, wire: &[u8]) -> Result<()> {
        let mut writer = self.inner.lock().await;
        
        if let Err(e) = writer.send(wire).await {
            warn!("Bus write failed: {}", e);
            self.status.send_replace(LinkStatus::offline(Some(e.to_string())));
            return Err(Error::ConnectivityLost(e.to_string()));
        }
        
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use poolbus_core::{Protocol, constants::actions};
    use poolbus_transport::StreamTransport;
    use poolbus_types::Address;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    
    const PUMP_STATUS_REQUEST: [u8; 11] =
        [0xFF, 0x00, 0xFF, 0xA5, 0x00, 0x60, 0x10, 0x07, 0x00, 0x01, 0x1C];
    
    /// Hands out one prepared stream per connect
    struct QueueTransport {
        streams: VecDeque<DuplexStream>,
    }
    
    #[async_trait]
    impl Transport for QueueTransport {
        async fn open(&mut self) -> poolbus_transport::Result<Connection> {
            let stream = self
                .streams
                .pop_front()
                .ok_or(poolbus_transport::Error::ConnectionTimeout)?;
            let (read, write) = tokio::io::split(stream);
            Ok(Connection::new(read, write, "queue"))
        }
        
        fn remote_addr(&self) -> String {
            "queue".into()
        }
    }
    
    fn recording_registry(address: Address) -> (DeviceRegistry, Arc<SyncMutex<Vec<Frame>>>) {
        let frames = Arc::new(SyncMutex::new(Vec::new()));
        let sink = frames.clone();
        
        let mut registry = DeviceRegistry::new();
        registry
            .register(address, move |frame: &Frame| sink.lock().push(frame.clone()))
            .unwrap();
        
        (registry, frames)
    }
    
    fn pump_response(payload: &[u8]) -> BytesMut {
        let message = Message::with_payload(0x10, actions::PUMP_STATUS, payload.to_vec());
        writer::encode(&message, 0x60).unwrap()
    }
    
    #[tokio::test]
    async fn test_reader_dispatches_until_closed() {
        let (client, mut server) = tokio::io::duplex(1024);
        let (registry, received) = recording_registry(Address::PUMP_1);
        
        let mut bus = Bus::new(StreamTransport::new(client, "duplex"), registry);
        let mut status = bus.status();
        let (reader, _writer) = bus.connect().await.unwrap();
        assert!(bus.is_online());
        
        let task = tokio::spawn(reader.run());
        
        server.write_all(&PUMP_STATUS_REQUEST).await.unwrap();
        server.write_all(&pump_response(&[0x0A, 0x02])).await.unwrap();
        server.write_all(&writer::encode_auxiliary(0x00, 0x12, &[0x4C, 0x81]).unwrap()).await.unwrap();
        server.write_all(&pump_response(&[0x0B])).await.unwrap();
        drop(server);
        
        let result = task.await.unwrap();
        assert!(matches!(result, Err(Error::ConnectivityLost(_))));
        
        {
            let frames = received.lock();
            assert_eq!(frames.len(), 2);
            assert_eq!(frames[0].payload().as_ref(), &[0x0A, 0x02]);
            assert_eq!(frames[1].payload().as_ref(), &[0x0B]);
        }
        
        status.changed().await.unwrap();
        assert!(!status.borrow().is_online());
        assert!(!bus.is_online());
    }
    
    #[tokio::test]
    async fn test_next_frame_across_split_writes() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut bus = Bus::new(StreamTransport::new(client, "duplex"), DeviceRegistry::new());
        let (mut reader, _writer) = bus.connect().await.unwrap();
        
        let wire = pump_response(&[0x01, 0x02, 0x03]);
        let (head, tail) = wire.split_at(7);
        
        server.write_all(head).await.unwrap();
        let pending = tokio::spawn(async move {
            let frame = reader.next_frame().await.unwrap();
            (frame, reader)
        });
        
        tokio::task::yield_now().await;
        server.write_all(tail).await.unwrap();
        
        let (frame, mut reader) = pending.await.unwrap();
        assert_eq!(frame.source(), 0x60);
        assert_eq!(frame.payload().as_ref(), &[0x01, 0x02, 0x03]);
        assert_eq!(reader.dispatch(&frame), Delivery::FirstUnknown);
        assert_eq!(reader.stats().frames, 1);
    }
    
    #[tokio::test]
    async fn test_run_until_shutdown() {
        let (client, _server) = tokio::io::duplex(64);
        let mut bus = Bus::new(StreamTransport::new(client, "duplex"), DeviceRegistry::new());
        let (reader, _writer) = bus.connect().await.unwrap();
        
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(reader.run_until(async move {
            let _ = stopped.await;
        }));
        
        stop.send(()).unwrap();
        assert!(task.await.unwrap().is_ok());
        assert!(!bus.is_online());
    }
    
    #[tokio::test]
    async fn test_writer_stamps_own_address() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut bus = Bus::new(StreamTransport::new(client, "duplex"), DeviceRegistry::new())
            .with_config(BusConfig::new(0x22));
        let (_reader, writer) = bus.connect().await.unwrap();
        
        writer.send(&Message::new(0x60, actions::PUMP_STATUS)).await.unwrap();
        
        let mut buf = [0u8; 13];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(
            buf,
            [0xFF, 0xFF, 0xFF, 0x00, 0xFF, 0xA5, 0x00, 0x60, 0x22, 0x07, 0x00, 0x01, 0x2E]
        );
    }
    
    #[tokio::test]
    async fn test_concurrent_writers_do_not_interleave() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut bus = Bus::new(StreamTransport::new(client, "duplex"), DeviceRegistry::new());
        let (_reader, writer) = bus.connect().await.unwrap();
        
        let mut tasks = Vec::new();
        for dest in [0x60u16, 0x61] {
            let writer = writer.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..20u8 {
                    let message = Message::with_payload(dest, actions::PUMP_POWER, vec![i; 30]);
                    writer.send(&message).await.unwrap();
                }
            }));
        }
        
        let collector = tokio::spawn(async move {
            let mut decoder = FrameDecoder::new();
            let mut frames = Vec::new();
            let mut buf = [0u8; 17];
            while frames.len() < 40 {
                let n = server.read(&mut buf).await.unwrap();
                frames.extend(decoder.decode(&buf[..n]).unwrap());
            }
            (frames, decoder.stats())
        });
        
        for task in tasks {
            task.await.unwrap();
        }
        
        let (frames, stats) = collector.await.unwrap();
        assert_eq!(frames.len(), 40);
        assert_eq!(stats.checksum_errors, 0);
        assert_eq!(stats.framing_errors, 0);
        assert!(frames.iter().all(|f| f.protocol() == Protocol::Primary));
    }
    
    #[tokio::test]
    async fn test_write_failure_marks_offline() {
        let (client, server) = tokio::io::duplex(64);
        let mut bus = Bus::new(StreamTransport::new(client, "duplex"), DeviceRegistry::new());
        let (_reader, writer) = bus.connect().await.unwrap();
        drop(server);
        
        let result = writer.send(&Message::new(0x60, actions::PUMP_STATUS)).await;
        assert!(matches!(result, Err(Error::ConnectivityLost(_))));
        assert!(!bus.is_online());
    }
    
    #[tokio::test]
    async fn test_oversized_payload_is_not_connectivity_loss() {
        let (client, _server) = tokio::io::duplex(64);
        let mut bus = Bus::new(StreamTransport::new(client, "duplex"), DeviceRegistry::new());
        let (_reader, writer) = bus.connect().await.unwrap();
        
        let result = writer.send(&Message::with_payload(0x60, 0x01, vec![0; 40])).await;
        assert!(matches!(result, Err(Error::Core(_))));
        assert!(bus.is_online());
    }
    
    #[tokio::test]
    async fn test_reconnect_starts_fresh_session() {
        let (first, mut first_server) = tokio::io::duplex(1024);
        let (second, mut second_server) = tokio::io::duplex(1024);
        let transport = QueueTransport {
            streams: VecDeque::from([first, second]),
        };
        let mut bus = Bus::new(transport, DeviceRegistry::new());
        
        let unknown = pump_response(&[]);
        
        let (mut reader, _writer) = bus.connect().await.unwrap();
        first_server.write_all(&unknown).await.unwrap();
        first_server.write_all(&unknown).await.unwrap();
        let frame = reader.next_frame().await.unwrap();
        assert_eq!(reader.dispatch(&frame), Delivery::FirstUnknown);
        let frame = reader.next_frame().await.unwrap();
        assert_eq!(reader.dispatch(&frame), Delivery::RepeatUnknown);
        drop(first_server);
        assert!(reader.next_frame().await.is_err());
        
        let (mut reader, _writer) = bus.connect().await.unwrap();
        second_server.write_all(&unknown).await.unwrap();
        let frame = reader.next_frame().await.unwrap();
        assert_eq!(reader.dispatch(&frame), Delivery::FirstUnknown);
        
        // Queue exhausted
        assert!(bus.connect().await.is_err());
        assert!(!bus.is_online());
    }
}
