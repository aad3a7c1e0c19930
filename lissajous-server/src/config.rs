//! Server configuration
//!
//! Loaded from environment variables, with defaults for everything. The
//! binary seeds the environment from a `.env` file first when one exists.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use lissajous_runner::RunnerConfig;
use lissajous_runner::config::{
    DEFAULT_FFMPEG_BINARY, DEFAULT_PROGRESS_CAPACITY, DEFAULT_PROGRESS_INTERVAL,
};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,

    /// Directory holding `demo.html` and the files served under `/static`
    pub static_dir: PathBuf,

    /// Path or name of the ffmpeg executable
    pub ffmpeg_path: PathBuf,

    /// Inherit ffmpeg's stderr instead of capturing it
    pub debug: bool,

    /// Capacity of each job's progress queue
    pub progress_queue_capacity: usize,

    /// Frames between two progress messages
    pub progress_interval: u32,

    /// Root directory for per-job frame staging
    pub staging_dir: PathBuf,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Recognized variables:
    /// - PORT (default: 8000), binds 0.0.0.0:PORT
    /// - BIND_ADDR (optional, full socket address, overrides PORT)
    /// - STATIC_DIR (default: static)
    /// - FFMPEG_PATH (default: ffmpeg)
    /// - DEBUG (default: false)
    /// - PROGRESS_QUEUE_CAPACITY (default: 20)
    /// - PROGRESS_INTERVAL (default: 100)
    /// - STAGING_DIR (default: system temp directory)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = match var("BIND_ADDR") {
            Some(addr) => addr
                .parse::<SocketAddr>()
                .with_context(|| format!("BIND_ADDR is not a socket address: {}", addr))?,
            None => {
                let port = match var("PORT") {
                    Some(port) => port
                        .parse::<u16>()
                        .with_context(|| format!("PORT is not a valid port: {}", port))?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let static_dir = var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let ffmpeg_path = var("FFMPEG_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.ffmpeg_path);

        let debug = var("DEBUG")
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.debug);

        let progress_queue_capacity = var("PROGRESS_QUEUE_CAPACITY")
            .map(|v| {
                v.parse::<usize>()
                    .with_context(|| format!("PROGRESS_QUEUE_CAPACITY is not a number: {}", v))
            })
            .transpose()?
            .unwrap_or(defaults.progress_queue_capacity);

        let progress_interval = var("PROGRESS_INTERVAL")
            .map(|v| {
                v.parse::<u32>()
                    .with_context(|| format!("PROGRESS_INTERVAL is not a number: {}", v))
            })
            .transpose()?
            .unwrap_or(defaults.progress_interval);

        let staging_dir = var("STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.staging_dir);

        let config = Self {
            bind_addr,
            static_dir,
            ffmpeg_path,
            debug,
            progress_queue_capacity,
            progress_interval,
            staging_dir,
        };
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.runner_config()
            .validate()
            .context("Invalid runner configuration")
    }

    /// Settings handed to the job runner
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            progress_capacity: self.progress_queue_capacity,
            progress_interval: self.progress_interval,
            staging_root: self.staging_dir.clone(),
            ffmpeg_binary: self.ffmpeg_path.clone(),
            encoder_debug: self.debug,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_BINARY),
            debug: false,
            progress_queue_capacity: DEFAULT_PROGRESS_CAPACITY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            staging_dir: std::env::temp_dir(),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8000");
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert!(!config.debug);
        assert_eq!(config.progress_queue_capacity, 20);
        assert_eq!(config.progress_interval, 100);
    }

    #[test]
    fn test_port_and_bind_addr() {
        let config = from_map(&[("PORT", "9090")]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:9090");

        let config = from_map(&[("PORT", "9090"), ("BIND_ADDR", "127.0.0.1:7000")]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:7000");

        assert!(from_map(&[("PORT", "eighty")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("FFMPEG_PATH", "/opt/ffmpeg/bin/ffmpeg"),
            ("DEBUG", "true"),
            ("PROGRESS_QUEUE_CAPACITY", "5"),
            ("PROGRESS_INTERVAL", "10"),
            ("STAGING_DIR", "/var/tmp"),
        ])
        .unwrap();

        let runner = config.runner_config();
        assert_eq!(runner.ffmpeg_binary, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert!(runner.encoder_debug);
        assert_eq!(runner.progress_capacity, 5);
        assert_eq!(runner.progress_interval, 10);
        assert_eq!(runner.staging_root, PathBuf::from("/var/tmp"));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        assert!(from_map(&[("PROGRESS_QUEUE_CAPACITY", "0")]).is_err());
        assert!(from_map(&[("PROGRESS_INTERVAL", "0")]).is_err());
        assert!(from_map(&[("FFMPEG_PATH", "")]).is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
