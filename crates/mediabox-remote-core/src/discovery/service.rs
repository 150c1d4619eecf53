//! Discovery service: owns the registry and the listener/reaper tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::info;

use super::events::{DiscoveryEvent, EVENT_CHANNEL_CAPACITY};
use super::listener::{AnnouncementListener, ListenerState};
use super::reaper::ExpiryReaper;
use super::registry::DeviceRegistry;
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::types::Device;

struct Running {
    shutdown: watch::Sender<bool>,
    listener: JoinHandle<()>,
    reaper: JoinHandle<()>,
    listener_state: watch::Receiver<ListenerState>,
}

/// Framework-agnostic discovery service.
///
/// Dropping a running service drops the shutdown sender, which stops both
/// tasks on their own.
pub struct DiscoveryService {
    config: DiscoveryConfig,
    registry: Arc<DeviceRegistry>,
    events: broadcast::Sender<DiscoveryEvent>,
    running: Option<Running>,
}

impl DiscoveryService {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self::with_registry(config, Arc::new(DeviceRegistry::new()))
    }

    /// Build a service around an existing registry.
    pub fn with_registry(config: DiscoveryConfig, registry: Arc<DeviceRegistry>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            registry,
            events,
            running: None,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Shared handle for readers such as device lists.
    pub fn registry(&self) -> Arc<DeviceRegistry> {
        self.registry.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn listener_state(&self) -> ListenerState {
        self.running
            .as_ref()
            .map(|r| *r.listener_state.borrow())
            .unwrap_or(ListenerState::Closed)
    }

    pub async fn snapshot(&self) -> Vec<Device> {
        self.registry.snapshot().await
    }

    /// Spawn the listener and reaper. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), DiscoveryError> {
        debug_assert!(
            self.running.is_none(),
            "discovery service started while already running"
        );
        if self.running.is_some() {
            return Err(DiscoveryError::AlreadyRunning);
        }

        let (shutdown, shutdown_rx) = watch::channel(false);

        let listener =
            AnnouncementListener::new(self.config.clone(), self.registry.clone(), self.events.clone());
        let listener_state = listener.state();
        let reaper = ExpiryReaper::new(
            self.registry.clone(),
            self.config.ttl(),
            self.config.reaper_period(),
            self.events.clone(),
        );

        self.running = Some(Running {
            listener: listener.spawn(shutdown_rx.clone()),
            reaper: reaper.spawn(shutdown_rx),
            shutdown,
            listener_state,
        });

        info!(port = self.config.port, "discovery service started");
        Ok(())
    }

    /// Signal both tasks and wait for them to exit. Idempotent.
    pub async fn shutdown(&mut self) -> Result<(), DiscoveryError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        let _ = running.shutdown.send(true);

        let listener = running.listener.await;
        let reaper = running.reaper.await;
        listener.map_err(|e| DiscoveryError::TaskFailed(format!("listener: {}", e)))?;
        reaper.map_err(|e| DiscoveryError::TaskFailed(format!("reaper: {}", e)))?;

        info!("discovery service stopped");
        Ok(())
    }

    /// Discover devices for a given duration and return the result.
    ///
    /// Fails only if the listener faulted and nothing was discovered.
    pub async fn discover_once(
        config: DiscoveryConfig,
        duration: Duration,
    ) -> Result<Vec<Device>, DiscoveryError> {
        let mut service = Self::new(config);
        let mut events = service.subscribe();
        service.start()?;

        tokio::time::sleep(duration).await;

        let devices = service.snapshot().await;
        service.shutdown().await?;

        let mut fault = None;
        while let Ok(event) = events.try_recv() {
            if let DiscoveryEvent::ListenerFault { message } = event {
                fault = Some(message);
            }
        }

        match fault {
            Some(message) if devices.is_empty() => Err(DiscoveryError::ListenerFault(message)),
            _ => Ok(devices),
        }
    }
}
