//! Table-formatted output for CLI.

use chrono::Utc;
use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use mediabox_remote_core::device::{Delivery, TargetDescriptor};
use mediabox_remote_core::Device;

use super::{delivery_label, OutputFormatter};

pub struct TableOutput;

impl TableOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TableOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Seconds since the device was last heard, e.g. `3s ago`.
pub(crate) fn age(device: &Device) -> String {
    let secs = (Utc::now() - device.last_seen).num_seconds().max(0);
    format!("{}s ago", secs)
}

impl OutputFormatter for TableOutput {
    fn format_devices(&self, devices: &[Device]) -> String {
        if devices.is_empty() {
            return "No devices found.".to_string();
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Name", "Address", "ID", "Last Seen"]);

        for device in devices {
            table.add_row(vec![
                Cell::new(&device.name),
                Cell::new(&device.address),
                Cell::new(&device.id),
                Cell::new(age(device)),
            ]);
        }

        format!("{}\n\nFound {} device(s)", table, devices.len())
    }

    fn format_selection(&self, target: Option<&TargetDescriptor>, name: Option<&str>) -> String {
        match (target, name) {
            (Some(target), Some(name)) => format!("Selected: {} ({})", name.bold(), target),
            (Some(target), None) => format!("Selected: {}", target),
            (None, _) => "No device selected.".yellow().to_string(),
        }
    }

    fn format_send_results(
        &self,
        target: &TargetDescriptor,
        results: &[(String, Delivery)],
    ) -> String {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Token", "Status"]);

        let mut sent = 0;
        for (token, delivery) in results {
            let status = if *delivery == Delivery::Sent {
                sent += 1;
                Cell::new("OK").fg(Color::Green)
            } else {
                Cell::new(delivery_label(*delivery).to_uppercase()).fg(Color::Red)
            };
            table.add_row(vec![Cell::new(token), status]);
        }

        let failed = results.len() - sent;
        let summary = format!(
            "\n{}: {} sent, {} failed",
            target,
            sent.to_string().green(),
            failed.to_string().red()
        );

        format!("{}{}", table, summary)
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}
