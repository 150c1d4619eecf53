//! UDP device discovery module.
//!
//! Provides announcement parsing, the shared device registry, the TTL reaper,
//! the announcement listener and a service tying them together.

pub mod announcement;
pub mod announcer;
pub mod events;
pub mod listener;
pub mod reaper;
pub mod registry;
pub mod service;

pub use announcement::{parse_announcement, Announcement, AnnouncementRejection};
pub use announcer::Announcer;
pub use events::DiscoveryEvent;
pub use listener::{AnnouncementListener, ListenerState};
pub use reaper::ExpiryReaper;
pub use registry::{DeviceRegistry, UpsertOutcome};
pub use service::DiscoveryService;

use tokio::sync::watch;

/// Resolves once shutdown is signalled or the signalling side is gone.
pub(crate) async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
