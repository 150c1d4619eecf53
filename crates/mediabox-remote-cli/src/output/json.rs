//! JSON-formatted output for CLI.

use mediabox_remote_core::device::{Delivery, TargetDescriptor};
use mediabox_remote_core::Device;
use serde::Serialize;
use serde_json::{json, Value};

use super::{delivery_label, OutputFormatter};

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn format_devices(&self, devices: &[Device]) -> String {
        let output = json!({
            "devices": devices,
            "count": devices.len()
        });
        Self::to_json(&output)
    }

    fn format_selection(&self, target: Option<&TargetDescriptor>, name: Option<&str>) -> String {
        Self::to_json(&json!({
            "selected": target.is_some(),
            "target": target,
            "name": name
        }))
    }

    fn format_send_results(
        &self,
        target: &TargetDescriptor,
        results: &[(String, Delivery)],
    ) -> String {
        let items: Vec<Value> = results
            .iter()
            .map(|(token, delivery)| {
                json!({
                    "token": token,
                    "sent": *delivery == Delivery::Sent,
                    "result": delivery_label(*delivery)
                })
            })
            .collect();

        let sent = results
            .iter()
            .filter(|(_, d)| *d == Delivery::Sent)
            .count();

        Self::to_json(&json!({
            "target": target,
            "results": items,
            "summary": {
                "total": results.len(),
                "sent": sent,
                "failed": results.len() - sent
            }
        }))
    }

    fn format_message(&self, message: &str) -> String {
        Self::to_json(&json!({ "message": message }))
    }
}
