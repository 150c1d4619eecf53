//! Runtime configuration for discovery and the command channel.
//!
//! Every field has a default, so a partial JSON file (or none at all) is valid.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::StorageError;

/// Well-known UDP port announcements are broadcast on
pub const ANNOUNCEMENT_PORT: u16 = 49550;

/// TCP port the device accepts commands on
pub const COMMAND_PORT: u16 = 2048;

/// Stored device value that selects the short-range transport
pub const DEFAULT_SHORT_RANGE_SENTINEL: &str = "00:02:72:13:75:93";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteConfig {
    pub discovery: DiscoveryConfig,
    pub channel: ChannelConfig,
}

impl RemoteConfig {
    /// Load configuration from a JSON file.
    pub async fn load(path: &Path) -> Result<Self, StorageError> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscoveryConfig {
    /// UDP port to listen for announcements on
    pub port: u16,
    /// Receive buffer size; announcements can be large
    pub receive_buffer: usize,
    /// Maximum age of a registry entry before it may be evicted
    pub ttl_secs: u64,
    /// Interval between reaper passes
    pub reaper_period_secs: u64,
    /// Pause before re-binding after a socket failure
    pub backoff_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: ANNOUNCEMENT_PORT,
            receive_buffer: 15000,
            ttl_secs: 15,
            reaper_period_secs: 10,
            backoff_secs: 10,
        }
    }
}

impl DiscoveryConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn reaper_period(&self) -> Duration {
        Duration::from_secs(self.reaper_period_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    /// Worst-case time a silent device stays listed.
    pub fn staleness_bound(&self) -> Duration {
        self.ttl() + self.reaper_period()
    }
}

/// What to do when a connection attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ReconnectPolicy {
    /// Single attempt; the caller re-opens explicitly.
    #[default]
    Manual,
    /// Extra attempts after the first, with a fixed delay between them.
    #[serde(rename_all = "camelCase")]
    Retry { attempts: u32, delay_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelConfig {
    pub command_port: u16,
    pub connect_timeout_ms: u64,
    pub short_range_sentinel: String,
    pub short_range_channel: u8,
    pub discovery_settle_timeout_ms: u64,
    pub reconnect: ReconnectPolicy,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_port: COMMAND_PORT,
            connect_timeout_ms: 5000,
            short_range_sentinel: DEFAULT_SHORT_RANGE_SENTINEL.to_string(),
            short_range_channel: 1,
            discovery_settle_timeout_ms: 12_000,
            reconnect: ReconnectPolicy::Manual,
        }
    }
}

impl ChannelConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn discovery_settle_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_settle_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RemoteConfig::default();
        assert_eq!(config.discovery.port, 49550);
        assert_eq!(config.discovery.receive_buffer, 15000);
        assert_eq!(config.discovery.staleness_bound(), Duration::from_secs(25));
        assert_eq!(config.channel.command_port, 2048);
        assert_eq!(config.channel.reconnect, ReconnectPolicy::Manual);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"discovery": {"ttlSecs": 30}, "channel": {"reconnect": {"mode": "retry", "attempts": 2, "delayMs": 250}}}"#;
        let config: RemoteConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.discovery.ttl_secs, 30);
        assert_eq!(config.discovery.reaper_period_secs, 10);
        assert_eq!(
            config.channel.reconnect,
            ReconnectPolicy::Retry {
                attempts: 2,
                delay_ms: 250
            }
        );
        assert_eq!(config.channel.short_range_sentinel, DEFAULT_SHORT_RANGE_SENTINEL);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.json");
        std::fs::write(&path, r#"{"channel": {"commandPort": 9000}}"#).unwrap();

        let config = RemoteConfig::load(&path).await.unwrap();
        assert_eq!(config.channel.command_port, 9000);
        assert_eq!(config.discovery, DiscoveryConfig::default());
    }
}
