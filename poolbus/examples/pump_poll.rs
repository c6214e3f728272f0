//! Pump polling example

use std::time::Duration;

use poolbus::{Address, Bus, BusConfig, DeviceRegistry, Frame, Message, Poller};

const PUMP_STATUS: u8 = 0x07;

#[tokio::main]
async fn main() -> poolbus::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();
    
    let host = std::env::var("BUS_HOST").unwrap_or_else(|_| "192.168.1.50".to_string());
    let own: Address = std::env::var("BUS_ADDRESS")
        .unwrap_or_else(|_| "0x21".to_string())
        .parse()?;
    
    let mut registry = DeviceRegistry::new();
    registry.register(Address::PUMP_1, |frame: &Frame| {
        if frame.action() == PUMP_STATUS {
            println!("Pump 1 status: {:02X?}", frame.payload().as_ref());
        }
    })?;
    
    let mut bus = Bus::tcp(host, 9801, registry).with_config(BusConfig::for_address(own)?);
    let (reader, writer) = bus.connect().await?;
    
    let poller = Poller::new(writer, Duration::from_secs(15))
        .with_message(Message::new(Address::PUMP_1.value(), PUMP_STATUS))
        .spawn();
    
    let result = reader.run().await;
    poller.abort();
    
    println!("Bus status: {}", *bus.status().borrow());
    result
}
