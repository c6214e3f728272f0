//! Type definitions for poolbus

pub mod address;
pub mod error;
pub mod status;

pub use address::Address;
pub use error::{Error, Result};
pub use status::LinkStatus;
