//! Output formatting for CLI results.

pub mod json;
pub mod table;

pub use json::JsonOutput;
pub use table::TableOutput;

use mediabox_remote_core::device::{Delivery, TargetDescriptor};
use mediabox_remote_core::Device;

/// Output formatter trait
pub trait OutputFormatter {
    /// Format device list
    fn format_devices(&self, devices: &[Device]) -> String;

    /// Format the stored device selection
    fn format_selection(&self, target: Option<&TargetDescriptor>, name: Option<&str>) -> String;

    /// Format per-token delivery results
    fn format_send_results(&self, target: &TargetDescriptor, results: &[(String, Delivery)])
        -> String;

    /// Format a generic message
    fn format_message(&self, message: &str) -> String;
}

/// Get the appropriate formatter based on JSON flag
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonOutput::new())
    } else {
        Box::new(TableOutput::new())
    }
}

pub(crate) fn delivery_label(delivery: Delivery) -> &'static str {
    match delivery {
        Delivery::Sent => "sent",
        Delivery::NotConnected => "not connected",
        Delivery::Failed => "failed",
        Delivery::Rejected => "rejected",
    }
}
