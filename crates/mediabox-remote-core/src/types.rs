//! Shared data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A set-top device currently known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Stable identifier taken from the announcement
    pub id: String,
    /// Display label
    pub name: String,
    /// Address used to open a command connection
    pub address: String,
    /// Wall-clock time of the most recent valid announcement
    pub last_seen: DateTime<Utc>,
}

impl Device {
    /// Label shown in device lists, e.g. `LivingRoom (192.168.1.50)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.address)
    }
}
