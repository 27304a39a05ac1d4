pub mod cgminer;
pub mod errors;
pub mod status;
