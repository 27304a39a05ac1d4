use crate::miners::api::rpc::errors::RPCError;
use serde_json::Value;

pub enum RPCCommandStatus {
    Success,
    Information,
    Warning,
    Error(String),
    Unknown,
}

impl RPCCommandStatus {
    pub fn into_result(self) -> Result<(), RPCError> {
        match self {
            RPCCommandStatus::Success => Ok(()),
            RPCCommandStatus::Information => Ok(()),
            RPCCommandStatus::Warning => Ok(()),
            RPCCommandStatus::Error(msg) => Err(RPCError::StatusCheckFailed(msg)),
            RPCCommandStatus::Unknown => {
                Err(RPCError::StatusCheckFailed(String::from("Unknown status")))
            }
        }
    }

    pub fn from_str(response: &str, message: Option<&str>) -> Self {
        match response {
            "S" => RPCCommandStatus::Success,
            "I" => RPCCommandStatus::Information,
            "W" => RPCCommandStatus::Warning,
            "E" | "F" => RPCCommandStatus::Error(message.unwrap_or("Unknown error").to_string()),
            _ => RPCCommandStatus::Unknown,
        }
    }

    /// Reads the `STATUS` block of a decoded response.
    ///
    /// Some firmware omits the block entirely, so a missing or oddly shaped block is
    /// treated as success rather than a failure.
    pub fn from_response(response: &Value) -> Self {
        let Some(status_obj) = response
            .get("STATUS")
            .and_then(|s| s.as_array())
            .and_then(|s| s.first())
        else {
            return RPCCommandStatus::Success;
        };

        match status_obj.get("STATUS").and_then(|s| s.as_str()) {
            Some(status) => {
                let message = status_obj.get("Msg").and_then(|m| m.as_str());
                Self::from_str(status, message)
            }
            None => RPCCommandStatus::Success,
        }
    }
}
