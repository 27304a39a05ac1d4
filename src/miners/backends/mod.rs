pub mod avalonminer;
pub mod traits;
