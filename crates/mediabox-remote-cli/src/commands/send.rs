//! Send, type, url and download command implementations.
//!
//! Each run opens the channel to the stored device, waits for it to come up,
//! writes its tokens in order and closes the channel again.

use std::sync::Arc;

use mediabox_remote_core::device::{Delivery, NoShortRangeAdapter};
use mediabox_remote_core::{ChannelState, Command, CommandChannel, Transport};
use tracing::debug;

use crate::cli::{SendArgs, TypeArgs, UrlArgs};
use crate::commands::Context;
use crate::error::CliError;
use crate::output::get_formatter;

/// Run the send command
pub async fn run_send(args: SendArgs, ctx: &Context) -> Result<(), CliError> {
    let commands = args
        .tokens
        .iter()
        .map(|token| token.parse::<Command>())
        .collect::<Result<Vec<_>, _>>()?;
    deliver(ctx, commands).await
}

/// Run the type command
pub async fn run_type(args: TypeArgs, ctx: &Context) -> Result<(), CliError> {
    let mut commands = Command::typing(&args.text)?;
    if args.enter {
        commands.push(Command::Enter);
    }
    deliver(ctx, commands).await
}

/// Run the url command
pub async fn run_url(args: UrlArgs, ctx: &Context) -> Result<(), CliError> {
    deliver(ctx, vec![Command::url(&args.url)?]).await
}

/// Run the download command
pub async fn run_download(args: UrlArgs, ctx: &Context) -> Result<(), CliError> {
    deliver(ctx, vec![Command::download(&args.url)?]).await
}

async fn deliver(ctx: &Context, commands: Vec<Command>) -> Result<(), CliError> {
    if commands.is_empty() {
        return Err(CliError::InvalidArgument("nothing to send".to_string()));
    }

    let store = ctx.store()?;
    let mut config = ctx.config.channel.clone();
    config.connect_timeout_ms = u64::try_from(ctx.timeout.as_millis()).unwrap_or(u64::MAX);
    // The short-range path may also wait for a radio inquiry to settle.
    let wait = ctx.timeout + config.discovery_settle_timeout();

    let channel = CommandChannel::new(Transport::new(config, Arc::new(NoShortRangeAdapter)));
    let target = channel
        .open_from_store(&store)
        .await?
        .ok_or(CliError::NoDeviceSelected)?;

    if channel.wait_until_settled(wait).await != ChannelState::Open {
        channel.close().await;
        return Err(CliError::NotConnected(target.to_string()));
    }

    let mut results = Vec::with_capacity(commands.len());
    for command in &commands {
        let delivery = channel.send(command).await;
        debug!(token = %command, ?delivery, "delivery");
        results.push((command.token(), delivery));
    }
    channel.close().await;

    println!(
        "{}",
        get_formatter(ctx.json).format_send_results(&target, &results)
    );

    let failed = results
        .iter()
        .filter(|(_, d)| *d != Delivery::Sent)
        .count();
    if failed > 0 {
        return Err(CliError::DeliveryFailed {
            failed,
            total: results.len(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediabox_remote_core::storage::DEVICE_KEY;
    use mediabox_remote_core::{ChannelConfig, RemoteConfig};
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn context(dir: &tempfile::TempDir, command_port: u16) -> Context {
        Context {
            config: RemoteConfig {
                channel: ChannelConfig {
                    command_port,
                    ..ChannelConfig::default()
                },
                ..RemoteConfig::default()
            },
            data_dir: Some(dir.path().to_path_buf()),
            timeout: Duration::from_secs(5),
            json: true,
        }
    }

    #[tokio::test]
    async fn test_send_without_selection() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, 2048);

        let args = SendArgs {
            tokens: vec!["PLAY".to_string()],
        };
        assert!(matches!(
            run_send(args, &ctx).await,
            Err(CliError::NoDeviceSelected)
        ));
    }

    #[tokio::test]
    async fn test_unknown_token_is_rejected_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, 2048);

        let args = SendArgs {
            tokens: vec!["PLAY".to_string(), "EJECT".to_string()],
        };
        let err = run_send(args, &ctx).await.unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_codes::INVALID_ARGS);
    }

    #[tokio::test]
    async fn test_type_delivers_keys_then_enter() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, listener.local_addr().unwrap().port());
        ctx.store()
            .unwrap()
            .set(DEVICE_KEY, "127.0.0.1")
            .await
            .unwrap();

        let reader = tokio::spawn(async move {
            let (mut peer, _) = listener.accept().await.unwrap();
            let mut received = String::new();
            peer.read_to_string(&mut received).await.unwrap();
            received
        });

        let args = TypeArgs {
            text: "hi".to_string(),
            enter: true,
        };
        run_type(args, &ctx).await.unwrap();

        assert_eq!(reader.await.unwrap(), "KEY:H\nKEY:I\nENTER\n");
    }

    #[tokio::test]
    async fn test_short_range_without_radio_is_not_connected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, 2048);
        ctx.store()
            .unwrap()
            .select_short_range(&ctx.config.channel.short_range_sentinel)
            .await
            .unwrap();

        let err = run_url(
            UrlArgs {
                url: "http://10.0.0.5/live.m3u8".to_string(),
            },
            &ctx,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::NotConnected(_)));
    }
}
