//! Select command implementation.

use std::time::Duration;

use mediabox_remote_core::device::TargetDescriptor;
use mediabox_remote_core::storage::{DEVICE_KEY, DEVICE_NAME_KEY};
use mediabox_remote_core::{ConfigStore, Device};
use tracing::info;

use crate::cli::SelectArgs;
use crate::commands::Context;
use crate::device::discovery::{discover_devices, DiscoveryOptions};
use crate::error::CliError;
use crate::output::get_formatter;

/// Run the select command
pub async fn run_select(args: SelectArgs, ctx: &Context) -> Result<(), CliError> {
    let store = ctx.store()?;
    let sentinel = ctx.config.channel.short_range_sentinel.clone();

    if args.short_range {
        store.select_short_range(&sentinel).await?;
    } else if let Some(target) = args.target.as_deref().filter(|_| !args.show) {
        let target = target.trim();
        if target.is_empty() {
            return Err(CliError::InvalidArgument("target cannot be empty".to_string()));
        }

        if args.raw {
            store.set(DEVICE_KEY, target).await?;
            store.remove(DEVICE_NAME_KEY).await?;
        } else {
            let options = DiscoveryOptions {
                config: ctx.config.discovery.clone(),
                duration: Duration::from_secs(args.duration),
                progress: !ctx.json,
            };
            let devices = discover_devices(options).await?;
            let device = find_device(&devices, target)
                .ok_or_else(|| CliError::DeviceNotFound(target.to_string()))?;

            store.select_device(device).await?;
            info!(device = %device.label(), "device selected");
        }
    }

    print_selection(&store, &sentinel, ctx.json).await
}

async fn print_selection(store: &ConfigStore, sentinel: &str, json: bool) -> Result<(), CliError> {
    let setting = store.get(DEVICE_KEY).await?;
    let name = store.get(DEVICE_NAME_KEY).await?;
    let target = setting
        .as_deref()
        .and_then(|s| TargetDescriptor::from_setting(s, sentinel));

    println!(
        "{}",
        get_formatter(json).format_selection(target.as_ref(), name.as_deref())
    );
    Ok(())
}

/// Match on id first, then on address.
fn find_device<'a>(devices: &'a [Device], target: &str) -> Option<&'a Device> {
    devices
        .iter()
        .find(|d| d.id == target)
        .or_else(|| devices.iter().find(|d| d.address == target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mediabox_remote_core::ChannelConfig;

    fn device(id: &str, address: &str) -> Device {
        Device {
            id: id.to_string(),
            name: format!("Box {}", id),
            address: address.to_string(),
            last_seen: Utc::now(),
        }
    }

    #[test]
    fn test_find_device_by_id_or_address() {
        let devices = vec![device("A1", "10.0.0.1"), device("B2", "10.0.0.2")];

        assert_eq!(find_device(&devices, "B2").map(|d| d.address.as_str()), Some("10.0.0.2"));
        assert_eq!(find_device(&devices, "10.0.0.1").map(|d| d.id.as_str()), Some("A1"));
        assert!(find_device(&devices, "C3").is_none());
    }

    #[tokio::test]
    async fn test_raw_and_short_range_selection() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            config: Default::default(),
            data_dir: Some(dir.path().to_path_buf()),
            timeout: Duration::from_secs(1),
            json: true,
        };

        let args = SelectArgs {
            target: Some("mediabox.local".to_string()),
            short_range: false,
            show: false,
            raw: true,
            duration: 1,
        };
        run_select(args, &ctx).await.unwrap();

        let store = ctx.store().unwrap();
        assert_eq!(
            store.get(DEVICE_KEY).await.unwrap().as_deref(),
            Some("mediabox.local")
        );

        let args = SelectArgs {
            target: None,
            short_range: true,
            show: false,
            raw: false,
            duration: 1,
        };
        run_select(args, &ctx).await.unwrap();
        assert_eq!(
            store.get(DEVICE_KEY).await.unwrap(),
            Some(ChannelConfig::default().short_range_sentinel)
        );
    }
}
