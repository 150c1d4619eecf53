//! Periodic eviction of devices that stopped announcing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::events::DiscoveryEvent;
use super::registry::DeviceRegistry;
use super::stopped;

/// Background task enforcing the registry TTL.
pub struct ExpiryReaper {
    registry: Arc<DeviceRegistry>,
    ttl: Duration,
    period: Duration,
    events: broadcast::Sender<DiscoveryEvent>,
}

impl ExpiryReaper {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        ttl: Duration,
        period: Duration,
        events: broadcast::Sender<DiscoveryEvent>,
    ) -> Self {
        Self {
            registry,
            ttl,
            period,
            events,
        }
    }

    /// Evict every device older than the TTL, as of now.
    pub async fn reap_once(&self) -> usize {
        let threshold = match Instant::now().checked_sub(self.ttl) {
            Some(t) => t,
            None => return 0,
        };

        let evicted = self.registry.evict_older_than(threshold).await;
        for device in &evicted {
            debug!(id = %device.id, name = %device.name, "removing expired device");
            let _ = self.events.send(DiscoveryEvent::DeviceExpired(device.clone()));
        }
        evicted.len()
    }

    /// Sleep one period, reap, repeat until shutdown is signalled.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            ttl_secs = self.ttl.as_secs(),
            period_secs = self.period.as_secs(),
            "expiry reaper started"
        );

        loop {
            tokio::select! {
                _ = stopped(&mut shutdown) => break,
                _ = sleep(self.period) => {}
            }

            let removed = self.reap_once().await;
            if removed > 0 {
                debug!(removed, "reaper pass complete");
            }
        }

        info!("expiry reaper stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
