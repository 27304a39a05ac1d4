use thiserror::Error;

#[derive(Error, Debug)]
pub enum RPCError {
    #[error("connection failed: {0}")]
    ConnectionFailed(std::io::Error),

    #[error("connect timed out")]
    ConnectTimeout,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no data received")]
    NoData,

    #[error("bad json: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    StatusCheckFailed(String),
}
