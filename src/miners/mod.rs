pub mod api;
pub mod backends;
pub mod fleet;
pub mod util;
