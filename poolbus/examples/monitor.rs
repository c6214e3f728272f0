//! Bus monitor example
//!
//! Prints every verified frame seen on the bus.

use poolbus::{Bus, DeviceRegistry};

#[tokio::main]
async fn main() -> poolbus::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();
    
    // Change to your RS-485 adapter
    let host = std::env::var("BUS_HOST").unwrap_or_else(|_| "192.168.1.50".to_string());
    let port = std::env::var("BUS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(9801);
    
    println!("Connecting to {}:{}...", host, port);
    
    let mut bus = Bus::tcp(host, port, DeviceRegistry::new());
    let (mut reader, _writer) = bus.connect().await?;
    println!("✓ Connected!");
    
    loop {
        let frame = reader.next_frame().await?;
        println!("{} raw={:02X?}", frame, frame.raw().as_ref());
    }
}
