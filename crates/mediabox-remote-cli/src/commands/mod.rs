//! Command implementations.

pub mod announce;
pub mod discover;
pub mod select;
pub mod send;

pub use announce::run_announce;
pub use discover::run_discover;
pub use select::run_select;
pub use send::{run_download, run_send, run_type, run_url};

use std::path::PathBuf;
use std::time::Duration;

use mediabox_remote_core::{ConfigStore, RemoteConfig};

use crate::error::CliError;

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: RemoteConfig,
    pub data_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub json: bool,
}

impl Context {
    pub fn store(&self) -> Result<ConfigStore, CliError> {
        let store = match &self.data_dir {
            Some(dir) => ConfigStore::new(dir.clone())?,
            None => ConfigStore::open_default()?,
        };
        Ok(store)
    }
}
