//! Discovery for the CLI.
//!
//! Thin wrapper around core's discovery service that adds name filtering and
//! a watch loop driven by registry events.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use mediabox_remote_core::discovery::{DiscoveryEvent, DiscoveryService};
use mediabox_remote_core::{Device, DiscoveryConfig};
use regex::{Regex, RegexBuilder};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::error::CliError;

/// Discovery options
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub config: DiscoveryConfig,
    /// Discovery duration
    pub duration: Duration,
    /// Show a spinner while listening
    pub progress: bool,
}

/// Case-insensitive matcher for a `*`/`?` glob over device names.
#[derive(Debug, Clone)]
pub struct NameFilter {
    regex: Regex,
}

impl NameFilter {
    pub fn new(glob: &str) -> Result<Self, CliError> {
        let mut pattern = String::from("^");
        for c in glob.chars() {
            match c {
                '*' => pattern.push_str(".*"),
                '?' => pattern.push('.'),
                c => pattern.push_str(&regex::escape(&c.to_string())),
            }
        }
        pattern.push('$');

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| CliError::InvalidArgument(format!("name pattern: {}", e)))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, device: &Device) -> bool {
        self.regex.is_match(&device.name)
    }
}

pub fn filter_devices(devices: Vec<Device>, filter: Option<&NameFilter>) -> Vec<Device> {
    match filter {
        Some(filter) => devices.into_iter().filter(|d| filter.matches(d)).collect(),
        None => devices,
    }
}

/// Discover devices on the network.
///
/// Delegates to core's `DiscoveryService::discover_once`.
pub async fn discover_devices(options: DiscoveryOptions) -> Result<Vec<Device>, CliError> {
    let spinner = options.progress.then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!(
            "Listening for players for {} seconds...",
            options.duration.as_secs()
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = DiscoveryService::discover_once(options.config, options.duration).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    Ok(result?)
}

/// Watch for devices until Ctrl+C, calling `on_update` with a fresh
/// snapshot after every registry change.
pub async fn watch_devices<F>(config: DiscoveryConfig, mut on_update: F) -> Result<(), CliError>
where
    F: FnMut(&[Device]),
{
    let mut service = DiscoveryService::new(config);
    let mut events = service.subscribe();
    service.start()?;

    on_update(&service.snapshot().await);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(DiscoveryEvent::ListenerFault { message }) => {
                    warn!(%message, "discovery listener fault");
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {
                    on_update(&service.snapshot().await);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    service.shutdown().await?;
    Ok(())
}
