//! Periodic announcement broadcaster.
//!
//! This is the device side of discovery. The CLI uses it to stand in for a
//! set-top box, and tests use it to drive the listener.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, warn};

use super::announcement::Announcement;
use super::stopped;
use crate::error::DiscoveryError;

/// Default interval between announcement bursts
pub const ANNOUNCE_INTERVAL: Duration = Duration::from_secs(10);

/// Each burst repeats the datagram to ride out packet loss
pub const ANNOUNCE_REPEAT: usize = 3;

pub struct Announcer {
    announcement: Announcement,
    target: SocketAddr,
    interval: Duration,
}

impl Announcer {
    /// Broadcast `announcement` to `255.255.255.255:port`.
    pub fn new(announcement: Announcement, port: u16) -> Self {
        Self {
            announcement,
            target: SocketAddr::from((Ipv4Addr::BROADCAST, port)),
            interval: ANNOUNCE_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Send to a specific address instead of the limited broadcast address.
    pub fn with_target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        self
    }

    fn open_socket(&self) -> Result<UdpSocket, DiscoveryError> {
        let bind_err = |source: std::io::Error| DiscoveryError::Bind { port: 0, source };

        let socket =
            Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;
        socket.set_broadcast(true).map_err(bind_err)?;

        let addr = SocketAddr::from(([0, 0, 0, 0], 0));
        socket.bind(&addr.into()).map_err(bind_err)?;
        socket.set_nonblocking(true).map_err(bind_err)?;

        UdpSocket::from_std(socket.into()).map_err(bind_err)
    }

    /// Send one burst of announcements.
    pub async fn announce_once(&self, socket: &UdpSocket) -> std::io::Result<()> {
        let payload = self.announcement.to_wire();
        for _ in 0..ANNOUNCE_REPEAT {
            socket.send_to(payload.as_bytes(), self.target).await?;
        }
        Ok(())
    }

    /// Broadcast until shutdown is signalled. Send failures are logged and
    /// the next burst is attempted on schedule.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), DiscoveryError> {
        let socket = self.open_socket()?;
        info!(
            target_addr = %self.target,
            id = %self.announcement.id,
            "announcer started"
        );

        loop {
            if let Err(e) = self.announce_once(&socket).await {
                warn!(error = %e, "could not broadcast announcement");
            }

            tokio::select! {
                _ = stopped(&mut shutdown) => break,
                _ = sleep(self.interval) => {}
            }
        }

        info!("announcer stopped");
        Ok(())
    }

    pub fn spawn(
        self,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<Result<(), DiscoveryError>> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::announcement::parse_announcement;

    #[tokio::test]
    async fn test_announce_once_sends_repeated_burst() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();

        let announcement = Announcement {
            id: "box1".to_string(),
            name: "Den".to_string(),
            address: "127.0.0.1".to_string(),
            features: vec!["PLAYER".to_string()],
        };
        let announcer = Announcer::new(announcement.clone(), target.port()).with_target(target);
        let socket = announcer.open_socket().unwrap();

        announcer.announce_once(&socket).await.unwrap();

        let mut buf = [0u8; 512];
        for _ in 0..ANNOUNCE_REPEAT {
            let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
            assert_eq!(parse_announcement(&buf[..len]).unwrap(), announcement);
        }
    }
}
