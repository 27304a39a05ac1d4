pub mod custom;
pub mod fleet;
pub mod status;
