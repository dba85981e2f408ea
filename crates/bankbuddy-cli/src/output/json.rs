use std::io;

use bankbuddy_client::{ClientError, FailureEnvelope, SuccessEnvelope};
use serde::Serialize;

/// Every command emits its full envelope: `{ok, command, version, data}`.
pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    serialize_json_pretty(success)
}

pub fn render_error_json(error: &ClientError) -> io::Result<String> {
    serialize_json_pretty(&FailureEnvelope::from(error))
}

fn serialize_json_pretty<T>(value: &T) -> io::Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use bankbuddy_client::{ClientError, SuccessEnvelope};
    use serde_json::{Value, json};

    use super::{render_error_json, render_success_json};

    #[test]
    fn success_json_keeps_envelope() {
        let payload = SuccessEnvelope {
            ok: true,
            command: "import list".to_string(),
            version: "0.1.0".to_string(),
            data: json!({"rows": [{"import_id": "imp_1"}]}),
        };

        let rendered = render_success_json(&payload);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let parsed: Result<Value, _> = serde_json::from_str(&text);
            assert!(parsed.is_ok());
            if let Ok(value) = parsed {
                assert_eq!(value["ok"], Value::Bool(true));
                assert_eq!(value["command"], "import list");
                assert_eq!(value["data"]["rows"][0]["import_id"], "imp_1");
            }
        }
    }

    #[test]
    fn error_json_uses_universal_shape() {
        let error = ClientError::new("ledger_empty", "no rows", vec!["import".to_string()]);
        let rendered = render_error_json(&error);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let parsed: Result<Value, _> = serde_json::from_str(&text);
            assert!(parsed.is_ok());
            if let Ok(value) = parsed {
                assert_eq!(value["error"]["code"], "ledger_empty");
                assert!(value.get("ok").is_none());
                assert!(value["error"].get("data").is_none());
            }
        }
    }

    #[test]
    fn error_json_carries_error_data() {
        let error = ClientError::account_not_found("joint_cc");
        let rendered = render_error_json(&error);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let parsed: Result<Value, _> = serde_json::from_str(&text);
            assert!(parsed.is_ok());
            if let Ok(value) = parsed {
                assert_eq!(value["error"]["code"], "account_not_found");
                assert!(value["error"]["data"].is_object());
            }
        }
    }
}
