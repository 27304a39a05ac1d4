use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod rpc;

/// A client able to run one cgminer-style RPC command against a single miner.
///
/// Any transport or decode failure comes back as an `Err`; callers never need to
/// distinguish between them.
#[async_trait]
pub trait RPCAPIClient: Send + Sync {
    async fn send_command(&self, command: &str, parameter: Option<Value>) -> Result<Value>;
}
