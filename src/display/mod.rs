use crate::data::fleet::FleetTable;
use crate::data::status::{MinerStatus, OperationalStatus};
use chrono::Local;
use console::{Term, style};
use std::fmt::Write as _;
use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

const RULE_WIDTH: usize = 165;
const PLACEHOLDER: &str = "...";
const STATUS_COLUMN: usize = 2;

/// Column headers and widths, in display order.
const COLUMNS: [(&str, usize); 13] = [
    ("IP Address", 15),
    ("Model", 8),
    ("Status", 8),
    ("Mode", 8),
    ("Power", 6),
    ("HR Cur", 7),
    ("HR Avg", 7),
    ("Temp", 6),
    ("Pool", 20),
    ("Last", 8),
    ("Best", 8),
    ("Rej%", 7),
    ("Uptime", 8),
];

/// Fleet-wide totals shown under the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetSummary {
    pub total: usize,
    pub active: usize,
    pub standby: usize,
    pub error: usize,
    /// Sum of every available average hash rate, TH/s
    pub hashrate: f64,
}

impl FleetSummary {
    pub fn collect(table: &FleetTable, ips: &[Ipv4Addr]) -> Self {
        let mut summary = FleetSummary {
            total: ips.len(),
            ..Default::default()
        };

        for status in ips.iter().filter_map(|ip| table.get(ip)) {
            match status.status {
                OperationalStatus::Active => summary.active += 1,
                OperationalStatus::StandBy => summary.standby += 1,
                OperationalStatus::Error => summary.error += 1,
                _ => {}
            }
            if let Ok(ths) = status.hashrate_average.parse::<f64>() {
                summary.hashrate += ths;
            }
        }

        summary
    }
}

/// Terminal renderer for the fleet table.
pub struct FleetView {
    term: Term,
    interval: Duration,
}

impl FleetView {
    pub fn new(interval: Duration) -> Self {
        Self {
            term: Term::stdout(),
            interval,
        }
    }

    pub fn print_banner(&self, miners: usize) -> io::Result<()> {
        self.term.write_line("Starting Avalon Fleet Monitor...")?;
        self.term.write_line(&format!(
            "Monitoring {miners} miners with {}s refresh interval",
            self.interval.as_secs()
        ))
    }

    pub fn print_goodbye(&self) -> io::Result<()> {
        self.term.write_line("\n\nShutting down Fleet Monitor...")
    }

    /// Clears the screen and prints the current table.
    pub fn draw(&self, table: &FleetTable, ips: &[Ipv4Addr]) -> io::Result<()> {
        let frame = self.render(table, ips);
        self.term.clear_screen()?;
        self.term.write_str(&frame)
    }

    pub fn render(&self, table: &FleetTable, ips: &[Ipv4Addr]) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{rule}\nAVALON FLEET MONITOR\n{rule}");
        let _ = writeln!(
            out,
            "Monitoring {} miners | Refresh interval: {}s | Last update: {}",
            ips.len(),
            self.interval.as_secs(),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "{rule}");

        let header: Vec<String> = COLUMNS
            .iter()
            .map(|(name, width)| pad(name, *width))
            .collect();
        let _ = writeln!(out, "{}", header.join(" "));
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

        let mut sorted = ips.to_vec();
        sorted.sort();
        for ip in &sorted {
            match table.get(ip) {
                Some(status) => {
                    let _ = writeln!(out, "{}", status_row(&status));
                    if let Some(error) = &status.error {
                        let _ = writeln!(out, "  └─ Error: {error}");
                    }
                }
                None => {
                    let _ = writeln!(out, "{}", scanning_row(*ip));
                }
            }
        }
        let _ = writeln!(out, "{rule}");

        let summary = FleetSummary::collect(table, ips);
        let _ = writeln!(
            out,
            "Total: {} | Active: {} | StandBy: {} | Error: {} | Fleet Hash Rate: {}",
            summary.total,
            style(summary.active).green(),
            style(summary.standby).yellow(),
            style(summary.error).red(),
            style(format!("{:.2} TH/s", summary.hashrate)).cyan(),
        );
        let _ = writeln!(out, "\nPress Ctrl+C to exit");

        out
    }
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

fn colorize(status: OperationalStatus, cell: String) -> String {
    match status {
        OperationalStatus::Active => style(cell).green().to_string(),
        OperationalStatus::StandBy => style(cell).yellow().to_string(),
        OperationalStatus::Error => style(cell).red().to_string(),
        _ => cell,
    }
}

fn status_row(m: &MinerStatus) -> String {
    let cells = [
        m.ip.to_string(),
        m.model.clone(),
        m.status.to_string(),
        m.work_mode.to_string(),
        m.power.clone(),
        m.hashrate_current.clone(),
        m.hashrate_average.clone(),
        m.temp_asic.clone(),
        m.active_pool.clone(),
        m.last_share_diff.clone(),
        m.best_share.clone(),
        m.rejected_pct.clone(),
        m.uptime.clone(),
    ];

    cells
        .iter()
        .zip(COLUMNS.iter())
        .enumerate()
        .map(|(idx, (cell, (_, width)))| {
            let padded = pad(cell, *width);
            if idx == STATUS_COLUMN {
                colorize(m.status, padded)
            } else {
                padded
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn scanning_row(ip: Ipv4Addr) -> String {
    COLUMNS
        .iter()
        .enumerate()
        .map(|(idx, (_, width))| match idx {
            0 => pad(&ip.to_string(), *width),
            STATUS_COLUMN => pad(&OperationalStatus::Scanning.to_string(), *width),
            _ => pad(PLACEHOLDER, *width),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
