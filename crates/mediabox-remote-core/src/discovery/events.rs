//! Notifications emitted by the discovery subsystem.

use crate::types::Device;

/// Capacity of the discovery event channel. Slow subscribers lag, they
/// never block the listener.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// First valid announcement for an id
    DeviceAdded(Device),
    /// Re-announcement of a known id
    DeviceUpdated(Device),
    /// Entry removed by the reaper
    DeviceExpired(Device),
    /// Non-fatal socket failure; the listener backs off and re-binds
    ListenerFault { message: String },
}
