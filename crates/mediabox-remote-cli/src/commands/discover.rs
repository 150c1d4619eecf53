//! Discover command implementation.

use std::io::{self, Write};
use std::time::Duration;

use colored::*;
use mediabox_remote_core::Device;

use crate::cli::DiscoverArgs;
use crate::commands::Context;
use crate::device::discovery::{
    discover_devices, filter_devices, watch_devices, DiscoveryOptions, NameFilter,
};
use crate::error::CliError;
use crate::output::table::age;
use crate::output::{get_formatter, OutputFormatter};

/// Run the discover command
pub async fn run_discover(args: DiscoverArgs, ctx: &Context) -> Result<(), CliError> {
    let formatter = get_formatter(ctx.json);
    let filter = args.name.as_deref().map(NameFilter::new).transpose()?;

    if args.watch {
        return run_watch_mode(ctx, filter, ctx.json).await;
    }

    let options = DiscoveryOptions {
        config: ctx.config.discovery.clone(),
        duration: Duration::from_secs(args.duration),
        progress: !ctx.json,
    };
    run_oneshot_mode(options, filter, formatter.as_ref()).await
}

async fn run_oneshot_mode(
    options: DiscoveryOptions,
    filter: Option<NameFilter>,
    formatter: &dyn OutputFormatter,
) -> Result<(), CliError> {
    let devices = discover_devices(options).await?;
    let devices = filter_devices(devices, filter.as_ref());

    println!("{}", formatter.format_devices(&devices));

    if devices.is_empty() {
        return Err(CliError::NoDevicesFound);
    }

    Ok(())
}

async fn run_watch_mode(
    ctx: &Context,
    filter: Option<NameFilter>,
    json: bool,
) -> Result<(), CliError> {
    if !json {
        println!("Watching for players (press Ctrl+C to stop)...\n");
    }

    watch_devices(ctx.config.discovery.clone(), move |devices| {
        let devices = filter_devices(devices.to_vec(), filter.as_ref());

        if json {
            // One JSON document per line so the stream can be piped.
            let output = serde_json::json!({
                "devices": devices,
                "count": devices.len()
            });
            println!("{}", output);
        } else {
            print_watch_table(&devices);
        }

        io::stdout().flush().ok();
    })
    .await
}

fn print_watch_table(devices: &[Device]) {
    // Clear screen and print header
    print!("\x1B[2J\x1B[1;1H");
    println!("{}", "MediaBox Player Watch".bold());
    println!("{}", "Press Ctrl+C to stop".dimmed());
    println!();

    println!(
        "{:<24} {:<18} {:<20} {:<10}",
        "Name".bold(),
        "Address".bold(),
        "ID".bold(),
        "Seen".bold()
    );
    println!("{}", "-".repeat(74));

    for device in devices {
        println!(
            "{:<24} {:<18} {:<20} {:<10}",
            truncate(&device.name, 22),
            device.address,
            truncate(&device.id, 18),
            age(device)
        );
    }

    println!();
    println!("Found {} device(s)", devices.len());
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Kitchen", 10), "Kitchen");
        assert_eq!(truncate("A very long player name", 10), "A very ...");
        assert_eq!(truncate("Wohnzimmer-Übertragung", 12), "Wohnzimme...");
    }
}
