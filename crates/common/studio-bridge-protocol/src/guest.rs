use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serializable half of a function declaration. The callback that backs it
/// stays on the guest side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub json_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<Value>,
    pub user_text: String,
    #[serde(
        rename = "imageDataURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_data_url: Option<String>,
    /// `None` enables every declaration sent with `init`, an empty list
    /// enables none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_functions: Option<Vec<String>>,
}

/// Messages posted by the guest to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GuestMessage {
    #[serde(rename_all = "camelCase")]
    Init {
        model: String,
        supports_screenshot: bool,
        function_declarations: Vec<FunctionDeclaration>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        system_instructions: Option<String>,
    },
    Chat {
        text: String,
    },
    ClearChat,
    #[serde(rename_all = "camelCase")]
    SetSystemInstructions {
        system_instructions: String,
    },
    ModelRequest(ModelRequest),
    Screenshot {
        #[serde(rename = "dataURL")]
        data_url: String,
    },
}

impl GuestMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            GuestMessage::Init { .. } => "init",
            GuestMessage::Chat { .. } => "chat",
            GuestMessage::ClearChat => "clearChat",
            GuestMessage::SetSystemInstructions { .. } => "setSystemInstructions",
            GuestMessage::ModelRequest(_) => "modelRequest",
            GuestMessage::Screenshot { .. } => "screenshot",
        }
    }
}
