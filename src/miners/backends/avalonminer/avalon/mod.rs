pub mod estats;

use crate::data::custom::CustomValue;
use crate::data::status::{MinerStatus, OperationalStatus, UNAVAILABLE, WorkMode, truncate_error};
use crate::miners::api::RPCAPIClient;
use crate::miners::api::rpc::cgminer::CGMinerRPC;
use crate::miners::backends::traits::GetMinerStatus;
use crate::miners::util::{
    format_difficulty, format_hashrate, format_pool, format_uptime, value_as_f64,
};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Local;
use estats::parse_custom_data;
use serde_json::Value;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tracing::{debug, warn};

const VERSION_CMD: &str = "version";
const ESTATS_CMD: &str = "estats";
const SUMMARY_CMD: &str = "summary";
const LCD_CMD: &str = "lcd";

/// `GHSspd`/`GHSavg` are GH/s.
const GHS_PER_THS: f64 = 1_000.0;
/// `MHS av`/`MHS 5s` are MH/s.
const MHS_PER_THS: f64 = 1_000_000.0;

#[derive(Debug)]
pub struct AvalonMiner<C = CGMinerRPC> {
    ip: Ipv4Addr,
    rpc: C,
}

impl AvalonMiner<CGMinerRPC> {
    pub fn new(ip: Ipv4Addr, port: u16, timeout: Duration) -> Self {
        let rpc = CGMinerRPC::new(IpAddr::V4(ip))
            .with_port(port)
            .with_timeout(timeout);
        Self { ip, rpc }
    }
}

impl<C: RPCAPIClient> AvalonMiner<C> {
    pub fn with_client(ip: Ipv4Addr, rpc: C) -> Self {
        Self { ip, rpc }
    }

    /// Polls `version`, `estats`, `summary` and `lcd` in that order and merges them.
    ///
    /// A failed call only leaves its own fields unavailable. The device is marked
    /// `Error` when every call failed or the custom data could not be interpreted.
    pub async fn reconcile(&self) -> MinerStatus {
        match self.collect().await {
            Ok(status) => status,
            Err(e) => {
                warn!(ip = %self.ip, error = %e, "miner poll failed");
                MinerStatus::failed(self.ip, e.to_string())
            }
        }
    }

    async fn collect(&self) -> Result<MinerStatus> {
        let mut status = MinerStatus::new(self.ip);
        let mut failures = Vec::new();

        if let Some(version) = self.query(VERSION_CMD, &mut failures).await {
            apply_version(&mut status, &version);
        }

        if let Some(estats) = self.query(ESTATS_CMD, &mut failures).await {
            let custom_data = parse_custom_data(&estats);
            debug!(ip = %self.ip, fields = custom_data.len(), "parsed custom data");
            apply_custom_data(&mut status, &custom_data)?;
        }

        if let Some(summary) = self.query(SUMMARY_CMD, &mut failures).await {
            apply_summary(&mut status, &summary);
        }

        if let Some(lcd) = self.query(LCD_CMD, &mut failures).await {
            apply_lcd(&mut status, &lcd);
        }

        match failures.first() {
            None => status.last_update = Some(Local::now()),
            Some((_, e)) if failures.len() == 4 => bail!("{e}"),
            Some((command, e)) => status.error = Some(truncate_error(&format!("{command}: {e}"))),
        }

        Ok(status)
    }

    async fn query(
        &self,
        command: &'static str,
        failures: &mut Vec<(&'static str, anyhow::Error)>,
    ) -> Option<Value> {
        match self.rpc.send_command(command, None).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(ip = %self.ip, command, error = %e, "rpc command failed");
                failures.push((command, e));
                None
            }
        }
    }
}

#[async_trait]
impl<C: RPCAPIClient> GetMinerStatus for AvalonMiner<C> {
    async fn get_status(&self) -> MinerStatus {
        self.reconcile().await
    }
}

fn first_entry<'a>(response: &'a Value, section: &str) -> Option<&'a Value> {
    response.get(section)?.as_array()?.first()
}

fn apply_version(status: &mut MinerStatus, response: &Value) {
    if let Some(model) = first_entry(response, "VERSION").and_then(|ver| {
        ver.get("MODEL")
            .or_else(|| ver.get("PROD"))
            .and_then(|m| m.as_str())
    }) {
        status.model = model.to_string();
    }
}

fn apply_custom_data(status: &mut MinerStatus, data: &HashMap<String, CustomValue>) -> Result<()> {
    status.status = match data.get("SoftOFF") {
        None => OperationalStatus::Active,
        Some(soft_off) => match soft_off.as_f64() {
            Some(v) if v > 0.0 => OperationalStatus::StandBy,
            Some(_) => OperationalStatus::Active,
            None => return Err(anyhow!("bad SoftOFF value {soft_off}")),
        },
    };

    if let Some(mode) = data.get("WORKMODE") {
        status.work_mode = mode.as_i64().map_or(WorkMode::Unknown, WorkMode::from_code);
    }

    if let Some(power) = data.get("MPO").filter(|v| v.is_numeric()) {
        status.power = format!("{power}W");
    }

    if let Some(ghs) = data.get("GHSspd").and_then(CustomValue::as_f64) {
        status.hashrate_current = format_hashrate(ghs, GHS_PER_THS);
    }

    if let Some(ghs) = data.get("GHSavg").and_then(CustomValue::as_f64) {
        status.hashrate_average = format_hashrate(ghs, GHS_PER_THS);
    }

    if let Some(temp) = ["TMax", "TAvg"]
        .iter()
        .filter_map(|key| data.get(*key))
        .find(|v| v.is_numeric())
    {
        status.temp_asic = format!("{temp}°C");
    }

    if let Some(elapsed) = data
        .get("Elapsed")
        .and_then(CustomValue::as_f64)
        .filter(|s| *s >= 0.0)
    {
        status.uptime = format_uptime(elapsed as u64);
    }

    Ok(())
}

fn apply_summary(status: &mut MinerStatus, response: &Value) {
    let Some(summary) = first_entry(response, "SUMMARY") else {
        return;
    };

    if status.hashrate_average == UNAVAILABLE {
        if let Some(mhs) = summary.get("MHS av").and_then(value_as_f64) {
            status.hashrate_average = format_hashrate(mhs, MHS_PER_THS);
        }
    }

    if status.hashrate_current == UNAVAILABLE {
        if let Some(mhs) = summary.get("MHS 5s").and_then(value_as_f64) {
            status.hashrate_current = format_hashrate(mhs, MHS_PER_THS);
        }
    }

    if let Some(rejected) = summary.get("Pool Rejected%").and_then(value_as_f64) {
        status.rejected_pct = format!("{rejected:.2}%");
    }
}

fn apply_lcd(status: &mut MinerStatus, response: &Value) {
    let Some(lcd) = first_entry(response, "LCD") else {
        return;
    };

    if let Some(pool) = lcd.get("Current Pool").and_then(|p| p.as_str()) {
        status.active_pool = format_pool(pool);
    }

    if let Some(diff) = lcd.get("Last Share Difficulty") {
        status.last_share_diff = format_difficulty(diff);
    }

    if let Some(best) = lcd.get("Best Share") {
        status.best_share = format_difficulty(best);
    }
}
