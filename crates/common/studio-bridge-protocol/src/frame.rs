use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::GuestMessage;

/// A host message as it arrives over a byte stream. `data` is kept raw so
/// that unknown kinds can be logged instead of failing the whole frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    pub origin: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundFrame {
    pub target_origin: String,
    pub data: GuestMessage,
}
