use serde::Serialize;
use serde_json::Value;

use crate::API_VERSION;
use crate::error::{ClientError, ClientResult};

/// Result of every command entry point. `command` selects the CLI renderer.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub ok: bool,
    pub command: String,
    pub version: String,
    pub data: Value,
}

/// `{"error": {code, message, recovery_steps, data?}}`, identical for every
/// command.
#[derive(Debug, Serialize)]
pub struct FailureEnvelope<'a> {
    pub error: ErrorBody<'a>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub code: &'a str,
    pub message: &'a str,
    pub recovery_steps: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a Value>,
}

impl<'a> From<&'a ClientError> for FailureEnvelope<'a> {
    fn from(error: &'a ClientError) -> Self {
        Self {
            error: ErrorBody {
                code: &error.code,
                message: &error.message,
                recovery_steps: &error.recovery_steps,
                data: error.data.as_ref(),
            },
        }
    }
}

pub fn success(command: &str, data: impl Serialize) -> ClientResult<SuccessEnvelope> {
    serde_json::to_value(data)
        .map(|data| SuccessEnvelope {
            ok: true,
            command: command.to_string(),
            version: API_VERSION.to_string(),
            data,
        })
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))
}
