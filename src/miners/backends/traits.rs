use crate::data::status::MinerStatus;
use async_trait::async_trait;

/// Trait that every miner backend must implement to produce a fleet status row.
#[async_trait]
pub trait GetMinerStatus: Send + Sync {
    /// Polls the miner and folds every response into one [`MinerStatus`].
    ///
    /// Never fails: problems are reported through the returned status.
    async fn get_status(&self) -> MinerStatus;
}
