//! UDP announcement listener.
//!
//! Binds the announcement port with broadcast reception enabled, feeds every
//! datagram through the parser and upserts accepted announcements. Socket
//! failures close the socket, raise a `ListenerFault` event, back off and
//! re-bind, so transient network loss never ends discovery.

use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace, warn};

use super::announcement::parse_announcement;
use super::events::DiscoveryEvent;
use super::registry::{DeviceRegistry, UpsertOutcome};
use super::stopped;
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Closed,
    Bound,
    Receiving,
}

/// Create a UDP socket bound to the announcement port.
///
/// Uses SO_REUSEADDR/SO_REUSEPORT so other listeners on the host can share
/// the port, and enables broadcast reception.
pub fn bind_announcement_socket(port: u16) -> Result<UdpSocket, DiscoveryError> {
    let bind_err = |source: std::io::Error| DiscoveryError::Bind { port, source };

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;

    socket.set_reuse_address(true).map_err(bind_err)?;

    #[cfg(unix)]
    socket.set_reuse_port(true).map_err(bind_err)?;

    socket.set_broadcast(true).map_err(bind_err)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    socket.bind(&addr.into()).map_err(bind_err)?;

    socket.set_nonblocking(true).map_err(bind_err)?;

    UdpSocket::from_std(socket.into()).map_err(bind_err)
}

pub struct AnnouncementListener {
    config: DiscoveryConfig,
    registry: Arc<DeviceRegistry>,
    events: broadcast::Sender<DiscoveryEvent>,
    state: watch::Sender<ListenerState>,
}

impl AnnouncementListener {
    pub fn new(
        config: DiscoveryConfig,
        registry: Arc<DeviceRegistry>,
        events: broadcast::Sender<DiscoveryEvent>,
    ) -> Self {
        let (state, _) = watch::channel(ListenerState::Closed);
        Self {
            config,
            registry,
            events,
            state,
        }
    }

    /// Observe state transitions.
    pub fn state(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: ListenerState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            trace!(?previous, ?next, "listener state");
        }
    }

    /// Parse one datagram and upsert it if accepted. Rejections are expected
    /// noise on a shared segment and are not reported.
    pub async fn handle_datagram(&self, data: &[u8], src: SocketAddr) {
        let announcement = match parse_announcement(data) {
            Ok(a) => a,
            Err(rejection) => {
                trace!(%src, %rejection, "ignoring datagram");
                return;
            }
        };

        let (outcome, device) = self
            .registry
            .upsert(
                &announcement.id,
                &announcement.name,
                &announcement.address,
                Instant::now(),
            )
            .await;

        match outcome {
            UpsertOutcome::Added => {
                info!(%src, id = %device.id, address = %device.address, "device added");
                let _ = self.events.send(DiscoveryEvent::DeviceAdded(device));
            }
            UpsertOutcome::Updated => {
                debug!(%src, id = %device.id, address = %device.address, "device updated");
                let _ = self.events.send(DiscoveryEvent::DeviceUpdated(device));
            }
        }
    }

    /// Report a fault, then wait out the backoff. Returns `true` if shutdown
    /// was requested while waiting.
    async fn fault_and_backoff(
        &self,
        err: DiscoveryError,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        let backoff = self.config.backoff();
        warn!(error = %err, backoff_secs = backoff.as_secs(), "announcement listener fault");
        let _ = self.events.send(DiscoveryEvent::ListenerFault {
            message: err.to_string(),
        });

        tokio::select! {
            _ = stopped(shutdown) => true,
            _ = sleep(backoff) => false,
        }
    }

    /// Receive loop. Runs until shutdown is signalled or the signal sender
    /// is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut buf = vec![0u8; self.config.receive_buffer];
        let mut socket: Option<UdpSocket> = None;

        info!(port = self.config.port, "announcement listener started");

        loop {
            if socket.is_none() {
                match bind_announcement_socket(self.config.port) {
                    Ok(s) => {
                        socket = Some(s);
                        self.set_state(ListenerState::Bound);
                    }
                    Err(e) => {
                        if self.fault_and_backoff(e, &mut shutdown).await {
                            break;
                        }
                        continue;
                    }
                }
            }
            let Some(sock) = socket.as_ref() else {
                continue;
            };

            self.set_state(ListenerState::Receiving);

            let received = tokio::select! {
                _ = stopped(&mut shutdown) => break,
                r = sock.recv_from(&mut buf) => r,
            };

            match received {
                Ok((len, src)) => self.handle_datagram(&buf[..len], src).await,
                Err(e) => {
                    socket = None;
                    self.set_state(ListenerState::Closed);
                    if self
                        .fault_and_backoff(DiscoveryError::Receive(e), &mut shutdown)
                        .await
                    {
                        break;
                    }
                }
            }
        }

        drop(socket);
        self.set_state(ListenerState::Closed);
        info!("announcement listener stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
