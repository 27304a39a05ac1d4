pub use crate::config::{Cli, Settings};
pub use crate::data::fleet::FleetTable;
pub use crate::data::status::{MinerStatus, OperationalStatus, WorkMode};
pub use crate::display::FleetView;
pub use crate::miners::fleet::FleetMonitor;

pub mod config;
pub mod data;
pub mod display;
pub mod logging;
pub mod miners;
