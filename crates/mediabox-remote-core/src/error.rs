//! Error types for the MediaBox remote core.

use thiserror::Error;

/// Core error type for shared operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Discovery subsystem errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to bind announcement socket on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Receive failed: {0}")]
    Receive(#[source] std::io::Error),

    #[error("Discovery service is already running")]
    AlreadyRunning,

    #[error("Announcement listener fault: {0}")]
    ListenerFault(String),

    #[error("Discovery task failed: {0}")]
    TaskFailed(String),
}

/// Command transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No usable address for {0}")]
    NoAddress(String),

    #[error("Connect to {target} failed: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection timeout to {0}")]
    Timeout(String),

    #[error("No short-range adapter available")]
    AdapterUnavailable,

    #[error("Peer {0} is not bonded")]
    PeerNotBonded(String),

    #[error("Radio discovery did not settle before connecting to {0}")]
    DiscoveryNotSettled(String),

    #[error("Write failed: {0}")]
    Write(#[source] std::io::Error),
}

/// Configuration store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access storage directory: {0}")]
    DirectoryAccess(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Command token errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command token")]
    Empty,

    #[error("Unknown command token: {0}")]
    Unknown(String),

    #[error("KEY expects one printable ASCII character, got {0:?}")]
    InvalidKey(String),

    #[error("{0} requires a non-empty payload")]
    MissingPayload(&'static str),

    #[error("Command tokens cannot contain line breaks")]
    LineBreak,
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
