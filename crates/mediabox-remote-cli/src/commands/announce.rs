//! Announce command implementation.
//!
//! Emulates a player by broadcasting announcements until Ctrl+C.

use std::time::Duration;

use mediabox_remote_core::discovery::{Announcement, Announcer};
use tokio::sync::watch;

use crate::cli::AnnounceArgs;
use crate::commands::Context;
use crate::error::CliError;
use crate::output::get_formatter;

/// Run the announce command
pub async fn run_announce(args: AnnounceArgs, ctx: &Context) -> Result<(), CliError> {
    let announcement = build_announcement(args.id, args.name, args.address, args.features)?;
    let port = ctx.config.discovery.port;

    println!(
        "{}",
        get_formatter(ctx.json).format_message(&format!(
            "Announcing {} on UDP port {} (press Ctrl+C to stop)",
            announcement, port
        ))
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let announcer = Announcer::new(announcement, port)
        .with_interval(Duration::from_secs(args.interval.max(1)))
        .spawn(stop_rx);

    tokio::signal::ctrl_c().await?;
    let _ = stop_tx.send(true);

    announcer
        .await
        .map_err(|e| CliError::Other(format!("announcer task: {}", e)))??;
    Ok(())
}

fn build_announcement(
    id: String,
    name: String,
    address: String,
    features: Vec<String>,
) -> Result<Announcement, CliError> {
    for (field, value) in [("id", &id), ("name", &name), ("address", &address)] {
        if value.trim().is_empty() {
            return Err(CliError::InvalidArgument(format!("{} cannot be empty", field)));
        }
        if value.contains(':') {
            return Err(CliError::InvalidArgument(format!(
                "{} cannot contain ':'",
                field
            )));
        }
    }

    let features: Vec<String> = features
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();

    Ok(Announcement {
        id,
        name,
        address,
        features,
    })
}
