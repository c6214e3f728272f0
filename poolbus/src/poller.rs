//! Periodic status requests
//!
//! Devices on the bus only report when asked; the poller asks on a fixed
//! interval through a shared [`BusWriter`].

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use poolbus_core::Message;

use crate::bus::BusWriter;
use crate::error::Result;

/// Sends a fixed set of messages on every tick
pub struct Poller {
    writer: BusWriter,
    interval: Duration,
    messages: Vec<Message>,
}

impl Poller {
    /// Create a poller; intervals shorter than a millisecond are raised
    pub fn new(writer: BusWriter, interval: Duration) -> Self {
        Self {
            writer,
            interval: interval.max(Duration::from_millis(1)),
            messages: Vec::new(),
        }
    }
    
    /// Add a message sent on every tick
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }
    
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
    
    /// Run on a new task
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }
    
    /// Send until a write fails
    ///
    /// The first tick fires immediately.
    ///
    /// # Errors
    ///
    /// Returns the write error that stopped polling.
    pub async fn run(self) -> Result<()> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        
        loop {
            ticker.tick().await;
            
            for message in &self.messages {
                if let Err(e) = self.writer.send(message).await {
                    warn!("Poller stopping: {}", e);
                    return Err(e);
                }
            }
            
            debug!(count = self.messages.len(), "Status requests sent");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bus, DeviceRegistry, Error};
    use poolbus_core::{FrameDecoder, constants::actions};
    use poolbus_transport::StreamTransport;
    use tokio::io::AsyncReadExt;
    
    #[tokio::test(start_paused = true)]
    async fn test_polls_every_interval() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut bus = Bus::new(StreamTransport::new(client, "duplex"), DeviceRegistry::new());
        let (_reader, writer) = bus.connect().await.unwrap();
        
        let poller = Poller::new(writer, Duration::from_secs(15))
            .with_message(Message::new(0x60, actions::PUMP_STATUS))
            .with_message(Message::new(0x61, actions::PUMP_STATUS));
        assert_eq!(poller.messages().len(), 2);
        let task = poller.spawn();
        
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        let mut buf = [0u8; 64];
        while frames.len() < 4 {
            let n = server.read(&mut buf).await.unwrap();
            frames.extend(decoder.decode(&buf[..n]).unwrap());
        }
        
        let destinations: Vec<u16> = frames.iter().map(|f| f.destination()).collect();
        assert_eq!(destinations, vec![0x60, 0x61, 0x60, 0x61]);
        assert!(frames.iter().all(|f| f.source() == 0x21));
        
        task.abort();
    }
    
    #[tokio::test]
    async fn test_stops_on_write_failure() {
        let (client, server) = tokio::io::duplex(64);
        let mut bus = Bus::new(StreamTransport::new(client, "duplex"), DeviceRegistry::new());
        let (_reader, writer) = bus.connect().await.unwrap();
        drop(server);
        
        let result = Poller::new(writer, Duration::from_secs(1))
            .with_message(Message::new(0x60, actions::PUMP_STATUS))
            .run()
            .await;
        
        assert!(matches!(result, Err(Error::ConnectivityLost(_))));
    }
}
