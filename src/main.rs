use anyhow::Result;
use avalon_fleet::logging::init_logging;
use avalon_fleet::{Cli, FleetMonitor, FleetTable, FleetView, Settings};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let settings = Settings::from_cli(&cli)?;
    info!(
        miners = settings.miners.len(),
        interval = ?settings.interval,
        port = settings.port,
        "configuration loaded"
    );

    let monitor = FleetMonitor::new(FleetTable::new())
        .with_rpc(settings.port, settings.timeout)
        .with_deadline(settings.deadline);
    let view = FleetView::new(settings.interval);

    monitor.run(&settings.miners, settings.interval, &view).await
}
