use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Id carried by responses that no command caused.
pub const EVENT_RESPONSE_ID: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
    Event,
}

/// Result of one command or one asynchronous world event, before it is
/// tagged with an id and a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl Outcome {
    pub fn new(status: Status, message: impl Into<String>, data: Option<JsonValue>) -> Self {
        Self {
            status,
            message: message.into(),
            data,
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(Status::Ok, message, None)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message, None)
    }

    pub fn event(message: impl Into<String>, data: Option<JsonValue>) -> Self {
        Self::new(Status::Event, message, data)
    }

    /// Map a handler's `(success, message, data)` triple.
    pub fn from_reply(success: bool, message: impl Into<String>, data: Option<JsonValue>) -> Self {
        let status = if success { Status::Ok } else { Status::Error };
        Self::new(status, message, data)
    }
}

/// An [`Outcome`] tagged with its command id and the tick it was recorded at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Response {
    pub id: u64,
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
    #[serde(rename = "tick")]
    pub step: u64,
}

impl Response {
    pub fn from_outcome(id: u64, step: u64, outcome: Outcome) -> Self {
        Self {
            id,
            status: outcome.status,
            message: outcome.message,
            data: outcome.data,
            step,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    pub fn is_event(&self) -> bool {
        self.status == Status::Event
    }
}
