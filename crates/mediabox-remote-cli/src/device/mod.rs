//! CLI-side wrappers around the core discovery service.

pub mod discovery;
