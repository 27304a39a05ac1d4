pub mod range;

use crate::miners::api::rpc::cgminer::DEFAULT_RPC_PORT;
use clap::Parser;
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub use range::{expand_all, parse_ip_range};

pub const DEFAULT_INTERVAL_SECS: i64 = 10;

const EXAMPLES: &str = "\
Examples:
  # Monitor miners from command line
  avalon-fleet --ips 192.168.1.100 192.168.1.101 192.168.1.102

  # Monitor with IP range or CIDR block
  avalon-fleet --ips 192.168.1.100-110 10.0.5.0/28

  # Monitor from config file, refreshing every 30 seconds
  avalon-fleet --config fleet.json --interval 30

Config file format (fleet.json):
  {
    \"miners\": [\"192.168.1.100\", \"192.168.1.101-110\"],
    \"interval\": 10,
    \"port\": 4028
  }";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("configuration file must contain a 'miners' array")]
    MissingMiners,

    #[error("must specify either --ips or --config")]
    NoSource,

    #[error("invalid IP address or range: {0}")]
    InvalidAddress(String),

    #[error("no valid miner IP addresses specified")]
    NoMiners,

    #[error("interval must be at least 1 second, got {0}")]
    InvalidInterval(i64),

    #[error("{0} must be a positive number of seconds, got {1}")]
    InvalidDuration(&'static str, f64),
}

/// Real-time monitoring for a fleet of Avalon miners.
#[derive(Parser, Debug, Clone)]
#[command(name = "avalon-fleet", version, about, after_help = EXAMPLES)]
pub struct Cli {
    /// IP addresses of miners (ranges like 192.168.1.100-110 and CIDR blocks allowed)
    #[arg(long, num_args = 1.., value_name = "IP")]
    pub ips: Vec<String>,

    /// Load configuration from a JSON file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Refresh interval in seconds [default: 10]
    #[arg(short, long, value_name = "SECONDS")]
    pub interval: Option<i64>,

    /// API port
    #[arg(short, long, default_value_t = DEFAULT_RPC_PORT, value_name = "PORT")]
    pub port: u16,

    /// Per-call connect and read timeout in seconds
    #[arg(long, default_value_t = 3.0, value_name = "SECONDS")]
    pub timeout: f64,

    /// How long one cycle waits for slow miners, in seconds
    #[arg(long, default_value_t = 5.0, value_name = "SECONDS")]
    pub deadline: f64,
}

/// On-disk fleet description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FleetFile {
    pub miners: Option<Vec<String>>,
    pub interval: Option<i64>,
    pub port: Option<u16>,
}

impl FleetFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Fully validated settings handed to the monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Sorted, deduplicated miner addresses
    pub miners: Vec<Ipv4Addr>,
    pub interval: Duration,
    pub port: u16,
    pub timeout: Duration,
    pub deadline: Duration,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = cli.config.as_deref().map(FleetFile::load).transpose()?;
        Self::resolve(cli, file)
    }

    /// Merges the command line with an optional config file.
    ///
    /// The file's miner list replaces `--ips`; an explicit `--interval` beats the file,
    /// and a non-default `--port` beats the file's port.
    pub fn resolve(cli: &Cli, file: Option<FleetFile>) -> Result<Self, ConfigError> {
        let (entries, file_interval, file_port) = match file {
            Some(file) => (
                file.miners.ok_or(ConfigError::MissingMiners)?,
                file.interval,
                file.port,
            ),
            None if !cli.ips.is_empty() => (cli.ips.clone(), None, None),
            None => return Err(ConfigError::NoSource),
        };

        let miners = expand_all(&entries)?;
        if miners.is_empty() {
            return Err(ConfigError::NoMiners);
        }

        let interval = cli
            .interval
            .or(file_interval)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval < 1 {
            return Err(ConfigError::InvalidInterval(interval));
        }

        let port = match file_port {
            Some(port) if cli.port == DEFAULT_RPC_PORT => port,
            _ => cli.port,
        };

        Ok(Settings {
            miners,
            interval: Duration::from_secs(interval as u64),
            port,
            timeout: positive_secs("timeout", cli.timeout)?,
            deadline: positive_secs("deadline", cli.deadline)?,
        })
    }
}

fn positive_secs(name: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidDuration(name, secs))
    } else {
        Err(ConfigError::InvalidDuration(name, secs))
    }
}
