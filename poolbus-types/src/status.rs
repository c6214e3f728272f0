//! Link status reported to the application

use std::fmt;

use chrono::{DateTime, Utc};

/// Connectivity of the bus link
///
/// This is the only state change surfaced to the application; framing and
/// checksum errors are absorbed by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// No connection, either never opened or lost
    Offline {
        since: DateTime<Utc>,
        reason: Option<String>,
    },
    
    /// Connected and reading frames
    Online {
        since: DateTime<Utc>,
        remote: String,
    },
}

impl LinkStatus {
    pub fn offline(reason: Option<String>) -> Self {
        Self::Offline {
            since: Utc::now(),
            reason,
        }
    }
    
    pub fn online(remote: impl Into<String>) -> Self {
        Self::Online {
            since: Utc::now(),
            remote: remote.into(),
        }
    }
    
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online { .. })
    }
    
    /// Time of the last transition
    pub fn since(&self) -> DateTime<Utc> {
        match self {
            Self::Offline { since, .. } | Self::Online { since, .. } => *since,
        }
    }
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self::offline(None)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline { since, reason: Some(reason) } => {
                write!(f, "Offline since {} ({})", since.to_rfc3339(), reason)
            }
            Self::Offline { since, reason: None } => {
                write!(f, "Offline since {}", since.to_rfc3339())
            }
            Self::Online { since, remote } => {
                write!(f, "Online to {} since {}", remote, since.to_rfc3339())
            }
        }
    }
}
