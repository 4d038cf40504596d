use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DecodeError;

/// Messages the host delivers to the guest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// The handshake. Its arrival fixes the trusted origin.
    Init,
    Screenshot,
    FunctionCall {
        name: String,
        #[serde(default)]
        args: Value,
    },
    #[serde(rename_all = "camelCase")]
    ModelResponse { request_id: String, text: String },
}

impl HostMessage {
    const KINDS: [&'static str; 4] = ["init", "screenshot", "functionCall", "modelResponse"];

    /// Decodes a raw message, telling unknown kinds apart from malformed
    /// known ones. `handshake` is accepted as a synonym for `init`.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingKind)?
            .to_owned();

        if kind == "handshake" {
            return Ok(HostMessage::Init);
        }
        if !Self::KINDS.contains(&kind.as_str()) {
            return Err(DecodeError::UnknownKind(kind));
        }

        serde_json::from_value(value).map_err(|source| DecodeError::Malformed { kind, source })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HostMessage::Init => "init",
            HostMessage::Screenshot => "screenshot",
            HostMessage::FunctionCall { .. } => "functionCall",
            HostMessage::ModelResponse { .. } => "modelResponse",
        }
    }

    pub fn is_handshake(&self) -> bool {
        matches!(self, HostMessage::Init)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handshake_alias_decodes_as_init() {
        let message = HostMessage::from_value(json!({"type": "handshake"})).unwrap();
        assert!(message.is_handshake());
    }

    #[test]
    fn init_ignores_extra_fields() {
        let message = HostMessage::from_value(json!({"type": "init", "version": 2})).unwrap();
        assert_eq!(message, HostMessage::Init);
    }

    #[test]
    fn function_call_without_args_gets_null() {
        let message = HostMessage::from_value(json!({"type": "functionCall", "name": "reset"}))
            .unwrap();
        assert_eq!(
            message,
            HostMessage::FunctionCall {
                name: "reset".into(),
                args: Value::Null,
            }
        );
    }

    #[test]
    fn unknown_kind_is_reported_by_name() {
        let err = HostMessage::from_value(json!({"type": "resize", "width": 10})).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownKind(kind) if kind == "resize"));
    }

    #[test]
    fn missing_kind() {
        assert!(matches!(
            HostMessage::from_value(json!({"text": "hi"})),
            Err(DecodeError::MissingKind)
        ));
        assert!(matches!(
            HostMessage::from_value(json!({"type": 7})),
            Err(DecodeError::MissingKind)
        ));
    }

    #[test]
    fn model_response_without_request_id_is_malformed() {
        let err = HostMessage::from_value(json!({"type": "modelResponse", "text": "hi"}))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { kind, .. } if kind == "modelResponse"));
    }
}
