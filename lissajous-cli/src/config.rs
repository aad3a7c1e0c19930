//! Configuration module
//!
//! Handles CLI configuration such as the service URL.

use lissajous_client::LissajousClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the render service
    pub server_url: String,
}

impl Config {
    pub fn client(&self) -> LissajousClient {
        LissajousClient::new(&self.server_url)
    }
}
