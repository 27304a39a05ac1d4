use crate::data::fleet::FleetTable;
use crate::data::status::MinerStatus;
use crate::display::FleetView;
use crate::miners::api::rpc::cgminer::{DEFAULT_RPC_PORT, DEFAULT_RPC_TIMEOUT};
use crate::miners::backends::avalonminer::avalon::AvalonMiner;
use crate::miners::backends::traits::GetMinerStatus;
use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

pub const DEFAULT_CYCLE_DEADLINE: Duration = Duration::from_secs(5);

/// Builds the backend used to poll one address.
pub type MinerBuilder = Arc<dyn Fn(Ipv4Addr) -> Box<dyn GetMinerStatus> + Send + Sync>;

/// Outcome of one polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Tasks that finished before the deadline and were published
    pub completed: usize,
    /// Tasks still running at the deadline; their table entries are untouched
    pub abandoned: usize,
}

/// Polls every miner of the fleet once per cycle and publishes the results.
pub struct FleetMonitor {
    table: FleetTable,
    deadline: Duration,
    builder: MinerBuilder,
}

impl FleetMonitor {
    pub fn new(table: FleetTable) -> Self {
        Self {
            table,
            deadline: DEFAULT_CYCLE_DEADLINE,
            builder: Self::avalon_builder(DEFAULT_RPC_PORT, DEFAULT_RPC_TIMEOUT),
        }
    }

    fn avalon_builder(port: u16, timeout: Duration) -> MinerBuilder {
        Arc::new(move |ip| -> Box<dyn GetMinerStatus> {
            Box::new(AvalonMiner::new(ip, port, timeout))
        })
    }

    /// Polls stock Avalon firmware on `port`, bounding each call by `timeout`.
    pub fn with_rpc(mut self, port: u16, timeout: Duration) -> Self {
        self.builder = Self::avalon_builder(port, timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(Ipv4Addr) -> Box<dyn GetMinerStatus> + Send + Sync + 'static,
    {
        self.builder = Arc::new(builder);
        self
    }

    pub fn table(&self) -> &FleetTable {
        &self.table
    }

    /// Runs one poll of every address, waiting at most for the cycle deadline.
    ///
    /// Tasks that miss the deadline are detached rather than aborted; whatever they
    /// eventually return is dropped and their table entry keeps its previous value.
    pub async fn run_cycle(&self, ips: &[Ipv4Addr]) -> CycleReport {
        let deadline = Instant::now() + self.deadline;

        let mut pending: FuturesUnordered<_> = ips
            .iter()
            .map(|&ip| {
                let miner = (self.builder)(ip);
                let handle = tokio::spawn(async move { miner.get_status().await });
                async move { (ip, handle.await) }
            })
            .collect();

        let mut report = CycleReport::default();
        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((_, Ok(status)))) => {
                    self.table.publish(status);
                    report.completed += 1;
                }
                Ok(Some((ip, Err(e)))) => {
                    error!(%ip, error = %e, "poll task failed");
                    self.table.publish(MinerStatus::failed(ip, "poll task crashed"));
                    report.completed += 1;
                }
                Ok(None) => break,
                Err(_) => {
                    report.abandoned = pending.len();
                    warn!(
                        abandoned = report.abandoned,
                        deadline = ?self.deadline,
                        "cycle deadline reached"
                    );
                    break;
                }
            }
        }

        report
    }

    /// Polls, renders and sleeps until Ctrl-C is received.
    pub async fn run(&self, ips: &[Ipv4Addr], interval: Duration, view: &FleetView) -> Result<()> {
        view.print_banner(ips.len())?;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                res = self.tick(ips, interval, view) => res?,
            }
        }

        view.print_goodbye()?;
        Ok(())
    }

    async fn tick(&self, ips: &[Ipv4Addr], interval: Duration, view: &FleetView) -> Result<()> {
        let report = self.run_cycle(ips).await;
        info!(
            completed = report.completed,
            abandoned = report.abandoned,
            "fleet cycle finished"
        );

        view.draw(&self.table, ips)?;
        tokio::time::sleep(interval).await;
        Ok(())
    }
}
