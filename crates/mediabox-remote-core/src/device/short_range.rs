//! Short-range wireless (RFCOMM-style) command transport.
//!
//! The radio itself is platform specific and is injected through
//! [`ShortRangeAdapter`]. Connecting follows the usual serial-port-profile
//! flow: stop any inquiry, find the bonded peer, refresh its service
//! records, let the inquiry settle, then open the channel.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use super::transport::CommandStream;
use crate::error::TransportError;

/// Interval between checks while waiting for a radio inquiry to finish
pub const DISCOVERY_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub address: String,
    pub name: String,
}

/// Platform radio operations needed to open a command stream.
#[async_trait]
pub trait ShortRangeAdapter: Send + Sync {
    /// Stop any inquiry in progress; inquiries slow down connection setup.
    async fn cancel_discovery(&self);

    async fn is_discovering(&self) -> bool;

    async fn bonded_peers(&self) -> Result<Vec<PeerInfo>, TransportError>;

    /// Refresh the peer's service records.
    async fn refresh_services(&self, peer: &PeerInfo) -> Result<(), TransportError>;

    async fn open_channel(
        &self,
        peer: &PeerInfo,
        channel: u8,
    ) -> Result<Box<dyn CommandStream>, TransportError>;
}

/// Adapter for hosts without a short-range radio.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShortRangeAdapter;

#[async_trait]
impl ShortRangeAdapter for NoShortRangeAdapter {
    async fn cancel_discovery(&self) {}

    async fn is_discovering(&self) -> bool {
        false
    }

    async fn bonded_peers(&self) -> Result<Vec<PeerInfo>, TransportError> {
        Err(TransportError::AdapterUnavailable)
    }

    async fn refresh_services(&self, _peer: &PeerInfo) -> Result<(), TransportError> {
        Err(TransportError::AdapterUnavailable)
    }

    async fn open_channel(
        &self,
        _peer: &PeerInfo,
        _channel: u8,
    ) -> Result<Box<dyn CommandStream>, TransportError> {
        Err(TransportError::AdapterUnavailable)
    }
}

/// Open a command stream to the bonded peer with address `peer`.
pub async fn connect(
    adapter: &dyn ShortRangeAdapter,
    peer: &str,
    channel: u8,
    settle_timeout: Duration,
) -> Result<Box<dyn CommandStream>, TransportError> {
    adapter.cancel_discovery().await;

    let peer_info = adapter
        .bonded_peers()
        .await?
        .into_iter()
        .find(|p| p.address.eq_ignore_ascii_case(peer))
        .ok_or_else(|| TransportError::PeerNotBonded(peer.to_string()))?;

    info!(peer = %peer_info.address, name = %peer_info.name, "connecting over short-range link");

    if let Err(e) = adapter.refresh_services(&peer_info).await {
        warn!(peer = %peer_info.address, error = %e, "service refresh failed");
    }

    wait_for_discovery_to_settle(adapter, peer, settle_timeout).await?;

    adapter.open_channel(&peer_info, channel).await
}

async fn wait_for_discovery_to_settle(
    adapter: &dyn ShortRangeAdapter,
    peer: &str,
    settle_timeout: Duration,
) -> Result<(), TransportError> {
    let deadline = Instant::now() + settle_timeout;

    while adapter.is_discovering().await {
        if Instant::now() >= deadline {
            return Err(TransportError::DiscoveryNotSettled(peer.to_string()));
        }
        sleep(DISCOVERY_POLL_INTERVAL).await;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    pub(crate) const PEER: &str = "00:02:72:13:75:93";

    /// In-memory radio whose channel is a duplex pipe.
    pub(crate) struct FakeAdapter {
        pub discovering_until: Instant,
        pub refresh_fails: bool,
        pub peers: Vec<PeerInfo>,
        pub remote_end: Mutex<Option<DuplexStream>>,
        pub opened_channel: Mutex<Option<u8>>,
    }

    impl FakeAdapter {
        pub(crate) fn new() -> Self {
            Self {
                discovering_until: Instant::now(),
                refresh_fails: false,
                peers: vec![PeerInfo {
                    address: PEER.to_string(),
                    name: "mediabox".to_string(),
                }],
                remote_end: Mutex::new(None),
                opened_channel: Mutex::new(None),
            }
        }

        pub(crate) fn take_remote(&self) -> Option<DuplexStream> {
            self.remote_end.lock().unwrap().take()
        }
    }

    #[async_trait]
    impl ShortRangeAdapter for FakeAdapter {
        async fn cancel_discovery(&self) {}

        async fn is_discovering(&self) -> bool {
            Instant::now() < self.discovering_until
        }

        async fn bonded_peers(&self) -> Result<Vec<PeerInfo>, TransportError> {
            Ok(self.peers.clone())
        }

        async fn refresh_services(&self, _peer: &PeerInfo) -> Result<(), TransportError> {
            if self.refresh_fails {
                Err(TransportError::AdapterUnavailable)
            } else {
                Ok(())
            }
        }

        async fn open_channel(
            &self,
            _peer: &PeerInfo,
            channel: u8,
        ) -> Result<Box<dyn CommandStream>, TransportError> {
            let (local, remote) = tokio::io::duplex(256);
            *self.remote_end.lock().unwrap() = Some(remote);
            *self.opened_channel.lock().unwrap() = Some(channel);
            Ok(Box::new(local))
        }
    }

    #[tokio::test]
    async fn test_connect_to_bonded_peer() {
        let adapter = FakeAdapter::new();

        let mut stream = connect(&adapter, PEER, 1, Duration::from_secs(1))
            .await
            .unwrap();
        stream.write_all(b"PLAY\n").await.unwrap();
        stream.shutdown().await.unwrap();

        let mut received = String::new();
        adapter
            .take_remote()
            .unwrap()
            .read_to_string(&mut received)
            .await
            .unwrap();
        assert_eq!(received, "PLAY\n");
        assert_eq!(*adapter.opened_channel.lock().unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_unbonded_peer_is_rejected() {
        let adapter = FakeAdapter::new();
        let result = connect(&adapter, "11:22:33:44:55:66", 1, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(TransportError::PeerNotBonded(_))));
    }

    #[tokio::test]
    async fn test_service_refresh_failure_is_not_fatal() {
        let mut adapter = FakeAdapter::new();
        adapter.refresh_fails = true;
        assert!(connect(&adapter, PEER, 1, Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_inquiry_to_settle() {
        let mut adapter = FakeAdapter::new();
        adapter.discovering_until = Instant::now() + Duration::from_secs(2);

        let started = Instant::now();
        connect(&adapter, PEER, 1, Duration::from_secs(12)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inquiry_wait_is_bounded() {
        let mut adapter = FakeAdapter::new();
        adapter.discovering_until = Instant::now() + Duration::from_secs(60);

        let result = connect(&adapter, PEER, 1, Duration::from_secs(3)).await;
        assert!(matches!(result, Err(TransportError::DiscoveryNotSettled(_))));
        assert!(adapter.take_remote().is_none());
    }

    #[tokio::test]
    async fn test_no_adapter() {
        let result = connect(&NoShortRangeAdapter, PEER, 1, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(TransportError::AdapterUnavailable)));
    }
}
