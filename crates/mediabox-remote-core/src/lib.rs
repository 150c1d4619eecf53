//! Core library for the MediaBox remote.
//!
//! Finds MediaBox set-top devices from their UDP broadcast announcements and
//! drives them through a line-oriented command channel over TCP or a
//! short-range serial link.

pub mod config;
pub mod device;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod storage;
pub mod types;

pub use config::{ChannelConfig, DiscoveryConfig, ReconnectPolicy, RemoteConfig};
pub use device::{ChannelState, CommandChannel, Delivery, TargetDescriptor, Transport};
pub use discovery::{DiscoveryEvent, DiscoveryService};
pub use error::{CoreError, Result};
pub use protocol::Command;
pub use storage::ConfigStore;
pub use types::Device;
