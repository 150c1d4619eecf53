//! Transport selection and the byte-stream session it produces.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::short_range::{self, ShortRangeAdapter};
use super::tcp;
use crate::config::ChannelConfig;
use crate::error::TransportError;

/// Ordered byte sink a command session writes to.
pub trait CommandStream: AsyncWrite + Send + Unpin {}

impl<T: AsyncWrite + Send + Unpin> CommandStream for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportKind {
    Tcp,
    ShortRange,
}

/// What the command channel should connect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TargetDescriptor {
    Network { host: String },
    ShortRange { peer: String },
}

impl TargetDescriptor {
    /// Interpret a stored device setting. The sentinel value selects the
    /// short-range transport; anything else is a network host.
    pub fn from_setting(value: &str, short_range_sentinel: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if value.eq_ignore_ascii_case(short_range_sentinel) {
            Some(TargetDescriptor::ShortRange {
                peer: value.to_string(),
            })
        } else {
            Some(TargetDescriptor::Network {
                host: value.to_string(),
            })
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            TargetDescriptor::Network { .. } => TransportKind::Tcp,
            TargetDescriptor::ShortRange { .. } => TransportKind::ShortRange,
        }
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetDescriptor::Network { host } => write!(f, "tcp://{}", host),
            TargetDescriptor::ShortRange { peer } => write!(f, "rfcomm://{}", peer),
        }
    }
}

/// An open command connection.
pub struct Session {
    kind: TransportKind,
    target: TargetDescriptor,
    stream: Box<dyn CommandStream>,
}

impl Session {
    pub fn new(target: TargetDescriptor, stream: Box<dyn CommandStream>) -> Self {
        Self {
            kind: target.kind(),
            target,
            stream,
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    pub fn target(&self) -> &TargetDescriptor {
        &self.target
    }

    /// Write `token` plus a newline as one line and flush it immediately.
    pub async fn write_line(&mut self, token: &str) -> std::io::Result<()> {
        let mut line = String::with_capacity(token.len() + 1);
        line.push_str(token);
        line.push('\n');

        self.stream.write_all(line.as_bytes()).await?;
        self.stream.flush().await
    }

    /// Shut the stream down. Errors only mean the peer is already gone.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(target_desc = %self.target, error = %e, "session shutdown");
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Opens sessions over whichever transport a target selects.
pub struct Transport {
    config: ChannelConfig,
    short_range: Arc<dyn ShortRangeAdapter>,
}

impl Transport {
    pub fn new(config: ChannelConfig, short_range: Arc<dyn ShortRangeAdapter>) -> Self {
        Self {
            config,
            short_range,
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Map a stored device setting to a target using the configured sentinel.
    pub fn target_for(&self, setting: &str) -> Option<TargetDescriptor> {
        TargetDescriptor::from_setting(setting, &self.config.short_range_sentinel)
    }

    pub async fn connect(&self, target: &TargetDescriptor) -> Result<Session, TransportError> {
        let stream: Box<dyn CommandStream> = match target {
            TargetDescriptor::Network { host } => Box::new(
                tcp::connect(host, self.config.command_port, self.config.connect_timeout()).await?,
            ),
            TargetDescriptor::ShortRange { peer } => {
                short_range::connect(
                    self.short_range.as_ref(),
                    peer,
                    self.config.short_range_channel,
                    self.config.discovery_settle_timeout(),
                )
                .await?
            }
        };

        Ok(Session::new(target.clone(), stream))
    }
}
