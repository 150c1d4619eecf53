//! Persistent settings for the remote.

pub mod preferences;

pub use preferences::{ConfigStore, DEVICE_KEY, DEVICE_NAME_KEY};

/// Get the default data directory for the MediaBox remote.
///
/// Uses the `directories` crate to find the appropriate platform-specific
/// data directory.
pub fn default_data_dir() -> Option<std::path::PathBuf> {
    directories::ProjectDirs::from("", "mediabox", "mediabox-remote")
        .map(|dirs| dirs.data_dir().to_path_buf())
}
