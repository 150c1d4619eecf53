//! Device registry shared by the listener, the reaper and readers.
//!
//! All operations go through one lock over the whole map. Entry counts are
//! small (tens of devices), so a coarse lock is sufficient.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::types::Device;

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated,
}

#[derive(Debug, Clone)]
struct Entry {
    device: Device,
    seen_at: Instant,
}

/// Concurrent map of device id to device.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, Entry>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new device or refresh an existing one in place.
    ///
    /// Returns the stored device as written under the same lock, so callers
    /// never observe a concurrent writer's state.
    pub async fn upsert(
        &self,
        id: &str,
        name: &str,
        address: &str,
        now: Instant,
    ) -> (UpsertOutcome, Device) {
        let mut devices = self.devices.write().await;

        match devices.get_mut(id) {
            Some(entry) => {
                entry.device.name = name.to_string();
                entry.device.address = address.to_string();
                entry.device.last_seen = Utc::now();
                entry.seen_at = now;
                (UpsertOutcome::Updated, entry.device.clone())
            }
            None => {
                let device = Device {
                    id: id.to_string(),
                    name: name.to_string(),
                    address: address.to_string(),
                    last_seen: Utc::now(),
                };
                devices.insert(
                    id.to_string(),
                    Entry {
                        device: device.clone(),
                        seen_at: now,
                    },
                );
                (UpsertOutcome::Added, device)
            }
        }
    }

    /// Point-in-time copy of every device, sorted by id.
    pub async fn snapshot(&self) -> Vec<Device> {
        let mut device_list: Vec<Device> = {
            let devices = self.devices.read().await;
            devices.values().map(|e| e.device.clone()).collect()
        };
        device_list.sort_by(|a, b| a.id.cmp(&b.id));
        device_list
    }

    /// Remove every device last seen before `threshold`, returning them.
    pub async fn evict_older_than(&self, threshold: Instant) -> Vec<Device> {
        let mut devices = self.devices.write().await;

        let stale: Vec<String> = devices
            .iter()
            .filter(|(_, e)| e.seen_at < threshold)
            .map(|(id, _)| id.clone())
            .collect();

        stale
            .into_iter()
            .filter_map(|id| devices.remove(&id))
            .map(|e| e.device)
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<Device> {
        self.devices.read().await.get(id).map(|e| e.device.clone())
    }

    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.devices.write().await.clear();
    }
}
