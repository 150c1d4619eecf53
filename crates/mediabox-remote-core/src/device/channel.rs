//! Stateful command channel to one device.
//!
//! `Closed -> Connecting -> Open -> Closed`. Connection attempts run on their
//! own task so `open` never blocks on the network. At most one session exists
//! per channel: any prior attempt or session is torn down before a new
//! attempt starts. Delivery is best effort, with no automatic retry unless a
//! [`ReconnectPolicy::Retry`] is configured.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, trace, warn};

use super::transport::{Session, TargetDescriptor, Transport, TransportKind};
use crate::config::ReconnectPolicy;
use crate::error::{StorageError, TransportError};
use crate::protocol::Command;
use crate::storage::{ConfigStore, DEVICE_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
}

/// Outcome of a send. Never an error: delivery is best effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Channel was closed or still connecting; nothing was written
    NotConnected,
    /// The write failed and the session was dropped
    Failed,
    /// Token contained a line break and was not sent
    Rejected,
}

#[derive(Default)]
struct Inner {
    session: Option<Session>,
    attempt: Option<JoinHandle<()>>,
    generation: u64,
}

pub struct CommandChannel {
    transport: Arc<Transport>,
    inner: Arc<Mutex<Inner>>,
    state: Arc<watch::Sender<ChannelState>>,
}

impl CommandChannel {
    pub fn new(transport: Transport) -> Self {
        let (state, _) = watch::channel(ChannelState::Closed);
        Self {
            transport: Arc::new(transport),
            inner: Arc::new(Mutex::new(Inner::default())),
            state: Arc::new(state),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.state.subscribe()
    }

    /// Kind of the open session, if any.
    pub async fn session_kind(&self) -> Option<TransportKind> {
        self.inner.lock().await.session.as_ref().map(Session::kind)
    }

    /// Start connecting to `target`, replacing any existing session.
    ///
    /// Returns as soon as the attempt is spawned; watch [`Self::subscribe`]
    /// or use [`Self::wait_for`] to learn the result.
    pub async fn open(&self, target: TargetDescriptor) {
        let mut inner = self.inner.lock().await;
        teardown(&mut inner).await;

        inner.generation += 1;
        let generation = inner.generation;
        self.state.send_replace(ChannelState::Connecting);
        debug!(target_desc = %target, generation, "opening command channel");

        inner.attempt = Some(tokio::spawn(connect_attempt(
            self.transport.clone(),
            target,
            generation,
            self.inner.clone(),
            self.state.clone(),
        )));
    }

    /// Open whatever device the configuration store selects.
    ///
    /// Returns the target chosen, or `None` (channel left closed) when no
    /// device has been selected yet.
    pub async fn open_from_store(
        &self,
        store: &ConfigStore,
    ) -> Result<Option<TargetDescriptor>, StorageError> {
        let setting = store.get(DEVICE_KEY).await?.unwrap_or_default();

        match self.transport.target_for(&setting) {
            Some(target) => {
                self.open(target.clone()).await;
                Ok(Some(target))
            }
            None => {
                warn!("no device selected; command channel stays closed");
                self.close().await;
                Ok(None)
            }
        }
    }

    pub async fn send(&self, command: &Command) -> Delivery {
        self.send_token(&command.token()).await
    }

    /// Write one token as its own line. A no-op unless the channel is open.
    pub async fn send_token(&self, token: &str) -> Delivery {
        if token.contains(['\n', '\r']) {
            warn!(token, "refusing token with line break");
            return Delivery::Rejected;
        }

        let mut inner = self.inner.lock().await;
        let Some(session) = inner.session.as_mut() else {
            trace!(token, state = ?self.state(), "channel not open, dropping command");
            return Delivery::NotConnected;
        };

        match session.write_line(token).await {
            Ok(()) => {
                debug!(token, kind = ?session.kind(), "command sent");
                Delivery::Sent
            }
            Err(e) => {
                warn!(token, error = %TransportError::Write(e), "command send failed");
                if let Some(session) = inner.session.take() {
                    session.close().await;
                }
                self.state.send_replace(ChannelState::Closed);
                Delivery::Failed
            }
        }
    }

    /// Release the session and cancel any attempt in flight. Idempotent.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        teardown(&mut inner).await;
        inner.generation += 1;

        if self.state.send_replace(ChannelState::Closed) != ChannelState::Closed {
            debug!("command channel closed");
        }
    }

    /// Wait until the channel reaches `wanted`. Returns `false` on timeout.
    pub async fn wait_for(&self, wanted: ChannelState, within: Duration) -> bool {
        let mut rx = self.state.subscribe();
        let reached = matches!(
            timeout(within, rx.wait_for(|s| *s == wanted)).await,
            Ok(Ok(_))
        );
        reached
    }

    /// Wait until the channel leaves `Connecting`, returning where it landed.
    pub async fn wait_until_settled(&self, within: Duration) -> ChannelState {
        let mut rx = self.state.subscribe();
        let _ = timeout(within, rx.wait_for(|s| *s != ChannelState::Connecting)).await;
        self.state()
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_lock() {
            if let Some(attempt) = inner.attempt.take() {
                attempt.abort();
            }
        }
    }
}

/// Cancel the attempt in flight and close the session. The aborted attempt is
/// joined so its socket is released before anything new is created.
async fn teardown(inner: &mut Inner) {
    if let Some(attempt) = inner.attempt.take() {
        attempt.abort();
        let _ = attempt.await;
    }
    if let Some(session) = inner.session.take() {
        info!(target_desc = %session.target(), "closing command session");
        session.close().await;
    }
}

async fn connect_with_policy(
    transport: &Transport,
    target: &TargetDescriptor,
) -> Result<Session, TransportError> {
    let (retries, delay) = match transport.config().reconnect {
        ReconnectPolicy::Manual => (0, Duration::ZERO),
        ReconnectPolicy::Retry {
            attempts,
            delay_ms,
        } => (attempts, Duration::from_millis(delay_ms)),
    };

    let mut attempt = 0;
    loop {
        match transport.connect(target).await {
            Ok(session) => return Ok(session),
            Err(e) if attempt < retries => {
                attempt += 1;
                debug!(target_desc = %target, error = %e, attempt, "connect failed, retrying");
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn connect_attempt(
    transport: Arc<Transport>,
    target: TargetDescriptor,
    generation: u64,
    inner: Arc<Mutex<Inner>>,
    state: Arc<watch::Sender<ChannelState>>,
) {
    let result = connect_with_policy(&transport, &target).await;

    let mut inner = inner.lock().await;
    if inner.generation != generation {
        // Superseded by a later open/close.
        if let Ok(session) = result {
            session.close().await;
        }
        return;
    }
    inner.attempt = None;

    match result {
        Ok(session) => {
            info!(target_desc = %target, kind = ?session.kind(), "command channel open");
            inner.session = Some(session);
            state.send_replace(ChannelState::Open);
        }
        Err(e) => {
            warn!(target_desc = %target, error = %e, "command channel connect failed");
            state.send_replace(ChannelState::Closed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use crate::device::short_range::tests::{FakeAdapter, PEER};
    use crate::device::short_range::NoShortRangeAdapter;
    use tokio::io::AsyncReadExt;

    fn channel_with(adapter: Arc<FakeAdapter>) -> CommandChannel {
        CommandChannel::new(Transport::new(ChannelConfig::default(), adapter))
    }

    fn short_range_target() -> TargetDescriptor {
        TargetDescriptor::ShortRange {
            peer: PEER.to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_while_closed_is_silent_noop() {
        let channel = CommandChannel::new(Transport::new(
            ChannelConfig::default(),
            Arc::new(NoShortRangeAdapter),
        ));

        assert_eq!(channel.state(), ChannelState::Closed);
        assert_eq!(channel.send(&Command::Play).await, Delivery::NotConnected);
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_open_send_close_over_short_range() {
        let adapter = Arc::new(FakeAdapter::new());
        let channel = channel_with(adapter.clone());

        channel.open(short_range_target()).await;
        assert!(channel.wait_for(ChannelState::Open, Duration::from_secs(5)).await);
        assert_eq!(channel.session_kind().await, Some(TransportKind::ShortRange));

        assert_eq!(channel.send(&Command::Play).await, Delivery::Sent);
        assert_eq!(channel.send(&Command::key('x').unwrap()).await, Delivery::Sent);
        channel.close().await;

        let mut received = String::new();
        adapter
            .take_remote()
            .unwrap()
            .read_to_string(&mut received)
            .await
            .unwrap();
        assert_eq!(received, "PLAY\nKEY:X\n");
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_times_out_when_never_opened() {
        let channel = channel_with(Arc::new(FakeAdapter::new()));

        assert!(!channel.wait_for(ChannelState::Open, Duration::from_secs(2)).await);
        assert!(channel.wait_for(ChannelState::Closed, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let channel = channel_with(Arc::new(FakeAdapter::new()));
        channel.close().await;
        channel.close().await;
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_failed_connect_returns_to_closed() {
        let mut adapter = FakeAdapter::new();
        adapter.peers.clear();
        let channel = channel_with(Arc::new(adapter));

        channel.open(short_range_target()).await;
        let settled = channel.wait_until_settled(Duration::from_secs(5)).await;

        assert_eq!(settled, ChannelState::Closed);
        assert_eq!(channel.send(&Command::Stop).await, Delivery::NotConnected);
    }

    #[tokio::test]
    async fn test_send_after_peer_hangs_up_fails_and_closes() {
        let adapter = Arc::new(FakeAdapter::new());
        let channel = channel_with(adapter.clone());

        channel.open(short_range_target()).await;
        assert!(channel.wait_for(ChannelState::Open, Duration::from_secs(5)).await);
        drop(adapter.take_remote());

        assert_eq!(channel.send(&Command::Menu).await, Delivery::Failed);
        assert_eq!(channel.state(), ChannelState::Closed);
        assert_eq!(channel.send(&Command::Menu).await, Delivery::NotConnected);
    }

    #[tokio::test]
    async fn test_rejects_token_with_line_break() {
        let adapter = Arc::new(FakeAdapter::new());
        let channel = channel_with(adapter);

        channel.open(short_range_target()).await;
        assert!(channel.wait_for(ChannelState::Open, Duration::from_secs(5)).await);
        assert_eq!(channel.send_token("PLAY\nSTOP").await, Delivery::Rejected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_attempt() {
        let mut adapter = FakeAdapter::new();
        adapter.discovering_until = tokio::time::Instant::now() + Duration::from_secs(5);
        let adapter = Arc::new(adapter);
        let channel = channel_with(adapter.clone());

        channel.open(short_range_target()).await;
        assert_eq!(channel.state(), ChannelState::Connecting);
        assert_eq!(channel.send(&Command::Play).await, Delivery::NotConnected);

        channel.close().await;
        sleep(Duration::from_secs(10)).await;

        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(adapter.take_remote().is_none());
    }
}
