//! High-level error types

use poolbus_types::Address;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] poolbus_core::Error),
    
    #[error("Transport error: {0}")]
    Transport(#[from] poolbus_transport::Error),
    
    #[error("Type error: {0}")]
    Types(#[from] poolbus_types::Error),
    
    #[error("Device already registered at {0}")]
    DuplicateDevice(Address),
    
    #[error("Connectivity lost: {0}")]
    ConnectivityLost(String),
}

impl Error {
    /// Check if the connection is gone and has to be reopened
    pub fn is_connectivity_loss(&self) -> bool {
        match self {
            Self::ConnectivityLost(_) => true,
            Self::Core(e) => e.requires_reconnect(),
            Self::Transport(_) => true,
            _ => false,
        }
    }
}
