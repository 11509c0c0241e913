//! HTTP networking module
//!
//! Provides the HTTP client the plugin distributor fetches manifests with.

mod client;

pub use client::HttpClient;
