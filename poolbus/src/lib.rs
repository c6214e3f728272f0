//! # poolbus
//!
//! Rust implementation of the RS-485 pool equipment bus codec.
//!
//! ## Features
//!
//! - Resynchronising frame scanner for the primary device bus and the
//!   auxiliary chlorinator protocol sharing the same wire
//! - Address-based routing of verified frames to device objects
//! - Serialised, checksummed outbound frames from any task
//! - Async/await API using Tokio
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use poolbus::{Bus, BusConfig, DeviceRegistry, Frame, Message, Poller};
//!
//! #[tokio::main]
//! async fn main() -> poolbus::Result<()> {
//!     // Register the devices this node cares about
//!     let mut registry = DeviceRegistry::new();
//!     registry.register(0x60u8, |frame: &Frame| println!("pump 1: {}", frame))?;
//!     
//!     // Connect through an RS-485 to Ethernet adapter
//!     let mut bus = Bus::tcp("192.168.1.50", 9801, registry).with_config(BusConfig::new(0x21));
//!     let (reader, writer) = bus.connect().await?;
//!     
//!     // Ask pump 1 for its status every 15 seconds
//!     Poller::new(writer, Duration::from_secs(15))
//!         .with_message(Message::new(0x60, 0x07))
//!         .spawn();
//!     
//!     // Read until the connection drops
//!     reader.run().await
//! }
//! ```

pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod poller;
pub mod registry;

// Re-exports
pub use bus::{Bus, BusReader, BusWriter};
pub use config::BusConfig;
pub use dispatcher::{Delivery, Dispatcher, UnregisteredSourceTracker};
pub use error::{Error, Result};
pub use poller::Poller;
pub use registry::{DeviceRegistry, DeviceSink};

// Re-export types
pub use poolbus_core::{Frame, Message, Protocol, ScanStats, UnderrunPolicy};
pub use poolbus_types::{Address, LinkStatus};
