//! Error types for the MediaBox remote CLI.
//!
//! CliError wraps CoreError from the shared library and adds CLI-specific variants.

use mediabox_remote_core::error::CoreError;
use thiserror::Error;

// Re-export core error types so command modules can use them via crate::error
pub use mediabox_remote_core::error::{
    CommandError, DiscoveryError, StorageError, TransportError,
};

/// Exit codes for the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NETWORK_ERROR: i32 = 2;
    pub const DEVICE_ERROR: i32 = 3;
    pub const INVALID_ARGS: i32 = 4;
}

/// Main error type for the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No devices found")]
    NoDevicesFound,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("No device selected; run `mediabox-remote select` first")]
    NoDeviceSelected,

    #[error("Could not connect to {0}")]
    NotConnected(String),

    #[error("{failed} of {total} command(s) were not delivered")]
    DeliveryFailed { failed: usize, total: usize },

    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(e) => match e {
                CoreError::Discovery(_) => exit_codes::NETWORK_ERROR,
                CoreError::Transport(_) => exit_codes::NETWORK_ERROR,
                CoreError::Command(_) => exit_codes::INVALID_ARGS,
                CoreError::Storage(_) => exit_codes::GENERAL_ERROR,
                CoreError::Io(_) => exit_codes::GENERAL_ERROR,
                CoreError::Other(_) => exit_codes::GENERAL_ERROR,
            },
            CliError::Io(_) => exit_codes::GENERAL_ERROR,
            CliError::InvalidArgument(_) => exit_codes::INVALID_ARGS,
            CliError::NoDevicesFound => exit_codes::GENERAL_ERROR,
            CliError::DeviceNotFound(_) => exit_codes::DEVICE_ERROR,
            CliError::NoDeviceSelected => exit_codes::INVALID_ARGS,
            CliError::NotConnected(_) => exit_codes::NETWORK_ERROR,
            CliError::DeliveryFailed { .. } => exit_codes::DEVICE_ERROR,
            CliError::Other(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

// Conversions from core error subtypes to CliError
impl From<DiscoveryError> for CliError {
    fn from(e: DiscoveryError) -> Self {
        CliError::Core(CoreError::Discovery(e))
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        CliError::Core(CoreError::Transport(e))
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        CliError::Core(CoreError::Storage(e))
    }
}

impl From<CommandError> for CliError {
    fn from(e: CommandError) -> Self {
        CliError::Core(CoreError::Command(e))
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let network: CliError = DiscoveryError::AlreadyRunning.into();
        assert_eq!(network.exit_code(), exit_codes::NETWORK_ERROR);

        let bad_token: CliError = CommandError::Unknown("EJECT".to_string()).into();
        assert_eq!(bad_token.exit_code(), exit_codes::INVALID_ARGS);

        assert_eq!(
            CliError::DeviceNotFound("box".to_string()).exit_code(),
            exit_codes::DEVICE_ERROR
        );
        assert_eq!(
            CliError::DeliveryFailed { failed: 1, total: 2 }.exit_code(),
            exit_codes::DEVICE_ERROR
        );
    }
}
