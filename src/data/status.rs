use chrono::{DateTime, Local};
use std::net::Ipv4Addr;
use strum::{Display, EnumString};

/// Placeholder shown for any field whose source data was absent or malformed.
pub const UNAVAILABLE: &str = "N/A";

/// Maximum length of the error description attached to a status.
pub const MAX_ERROR_LEN: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Default)]
pub enum OperationalStatus {
    Active,
    StandBy,
    Error,
    #[default]
    Unknown,
    Scanning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Default)]
pub enum WorkMode {
    Eco,
    Standard,
    Super,
    #[default]
    #[strum(serialize = "N/A")]
    Unknown,
}

impl WorkMode {
    /// Maps the `WORKMODE` code reported in the custom data blob.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => WorkMode::Eco,
            1 => WorkMode::Standard,
            2 => WorkMode::Super,
            _ => WorkMode::Unknown,
        }
    }
}

/// Canonical per-device record, rebuilt from scratch on every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct MinerStatus {
    /// The address this status was collected from
    pub ip: Ipv4Addr,
    /// Model identifier reported by `version`
    pub model: String,
    /// Operational state derived from the custom data blob
    pub status: OperationalStatus,
    /// Configured work level
    pub work_mode: WorkMode,
    /// Power draw, suffixed with `W`
    pub power: String,
    /// Current hash rate in TH/s
    pub hashrate_current: String,
    /// Average hash rate in TH/s
    pub hashrate_average: String,
    /// Hottest (or average) ASIC temperature, suffixed with `°C`
    pub temp_asic: String,
    /// Host portion of the active pool URL
    pub active_pool: String,
    /// Difficulty of the most recent share
    pub last_share_diff: String,
    /// Best share difficulty since boot
    pub best_share: String,
    /// Pool rejection percentage
    pub rejected_pct: String,
    /// Human readable uptime
    pub uptime: String,
    /// Set only when every call of the poll succeeded
    pub last_update: Option<DateTime<Local>>,
    /// Short description of the first failure seen, if any
    pub error: Option<String>,
}

impl MinerStatus {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip,
            model: UNAVAILABLE.to_string(),
            status: OperationalStatus::Unknown,
            work_mode: WorkMode::Unknown,
            power: UNAVAILABLE.to_string(),
            hashrate_current: UNAVAILABLE.to_string(),
            hashrate_average: UNAVAILABLE.to_string(),
            temp_asic: UNAVAILABLE.to_string(),
            active_pool: UNAVAILABLE.to_string(),
            last_share_diff: UNAVAILABLE.to_string(),
            best_share: UNAVAILABLE.to_string(),
            rejected_pct: UNAVAILABLE.to_string(),
            uptime: UNAVAILABLE.to_string(),
            last_update: None,
            error: None,
        }
    }

    /// A status with every display field unavailable and an `Error` state.
    pub fn failed(ip: Ipv4Addr, reason: impl AsRef<str>) -> Self {
        Self {
            status: OperationalStatus::Error,
            error: Some(truncate_error(reason.as_ref())),
            ..Self::new(ip)
        }
    }
}

/// Cuts an error description down to [`MAX_ERROR_LEN`] characters.
pub fn truncate_error(reason: &str) -> String {
    reason.chars().take(MAX_ERROR_LEN).collect()
}
