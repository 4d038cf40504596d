use std::{fmt, sync::Arc};

use bon::Builder;
use serde::Deserialize;
use serde_json::Value;
use studio_bridge_protocol::{GuestMessage, ModelRequest};

use crate::{BridgeError, FunctionDeclaration, Result, ScreenshotProvider};

/// Configuration handed to [`Bridge::init`](crate::Bridge::init).
#[derive(Default)]
pub struct InitOptions {
    pub(crate) model: Option<String>,
    pub(crate) screenshot_provider: Option<Arc<dyn ScreenshotProvider>>,
    pub(crate) function_declarations: Vec<FunctionDeclaration>,
    pub(crate) system_instructions: Option<String>,
}

impl InitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The host falls back to its own default if it does not support this
    /// model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn screenshot_provider(mut self, provider: impl ScreenshotProvider + 'static) -> Self {
        self.screenshot_provider = Some(Arc::new(provider));
        self
    }

    pub fn function(mut self, declaration: FunctionDeclaration) -> Self {
        self.function_declarations.push(declaration);
        self
    }

    pub fn functions(mut self, declarations: impl IntoIterator<Item = FunctionDeclaration>) -> Self {
        self.function_declarations.extend(declarations);
        self
    }

    pub fn system_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.system_instructions = Some(instructions.into());
        self
    }
}

impl fmt::Debug for InitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitOptions")
            .field("model", &self.model)
            .field("supports_screenshot", &self.screenshot_provider.is_some())
            .field("function_declarations", &self.function_declarations)
            .field("system_instructions", &self.system_instructions)
            .finish()
    }
}

/// Options for one [`Bridge::generate_content`](crate::Bridge::generate_content)
/// call.
///
/// ```
/// use studio_bridge::GenerateContentOptions;
///
/// let options = GenerateContentOptions::builder()
///     .user_text("Your move.")
///     .enabled_functions(vec!["play".to_string()])
///     .build();
/// assert!(!options.json_mode);
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentOptions {
    #[builder(into)]
    pub user_text: String,

    /// Overrides the model chosen at init for this call only.
    #[builder(into)]
    #[serde(default)]
    pub model: Option<String>,

    /// The host disables function calling while JSON mode is on.
    #[builder(default)]
    #[serde(default)]
    pub json_mode: bool,

    /// Only sent when `json_mode` is set.
    #[serde(default)]
    pub json_schema: Option<Value>,

    #[builder(into)]
    #[serde(default, rename = "imageDataURL")]
    pub image_data_url: Option<String>,

    /// `None` enables every declared function, an empty list none.
    #[serde(default)]
    pub enabled_functions: Option<Vec<String>>,
}

impl GenerateContentOptions {
    /// Parses options supplied as a loosely typed JSON object, checking
    /// `userText` before anything else.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(fields) = &value else {
            return Err(BridgeError::validation("options must be a JSON object"));
        };

        match fields.get("userText") {
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(BridgeError::validation(format!(
                    "userText must be a string, got {}",
                    json_type(other)
                )));
            }
            None => return Err(BridgeError::validation("userText is required")),
        }

        serde_json::from_value(value).map_err(|e| BridgeError::validation(e.to_string()))
    }

    pub(crate) fn into_message(self, request_id: String) -> GuestMessage {
        let json_mode = self.json_mode;
        GuestMessage::ModelRequest(ModelRequest {
            request_id,
            model: self.model,
            json_mode,
            json_schema: self.json_schema.filter(|_| json_mode),
            user_text: self.user_text,
            image_data_url: self.image_data_url,
            enabled_functions: self.enabled_functions,
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_user_text_is_rejected() {
        let err = GenerateContentOptions::from_json(json!({"userText": 123})).unwrap_err();
        assert!(matches!(err, BridgeError::Validation(reason) if reason.contains("number")));
    }

    #[test]
    fn missing_user_text_is_rejected() {
        let err = GenerateContentOptions::from_json(json!({"jsonMode": true})).unwrap_err();
        assert!(matches!(err, BridgeError::Validation(_)));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(GenerateContentOptions::from_json(json!("hello")).is_err());
    }

    #[test]
    fn json_options_match_builder() {
        let parsed = GenerateContentOptions::from_json(json!({
            "userText": "hello",
            "imageDataURL": "data:image/png;base64,AAAA",
            "enabledFunctions": ["play"],
        }))
        .unwrap();

        let built = GenerateContentOptions::builder()
            .user_text("hello")
            .image_data_url("data:image/png;base64,AAAA")
            .enabled_functions(vec!["play".into()])
            .build();

        assert_eq!(parsed, built);
    }

    #[test]
    fn schema_is_dropped_outside_json_mode() {
        let options = GenerateContentOptions::builder()
            .user_text("hi")
            .json_schema(json!({"type": "string"}))
            .build();

        let GuestMessage::ModelRequest(request) = options.into_message("4".into()) else {
            panic!("expected a model request");
        };
        assert_eq!(request.request_id, "4");
        assert_eq!(request.json_schema, None);
    }

    #[test]
    fn schema_is_kept_in_json_mode() {
        let options = GenerateContentOptions::builder()
            .user_text("hi")
            .json_mode(true)
            .json_schema(json!({"type": "string"}))
            .build();

        let GuestMessage::ModelRequest(request) = options.into_message("0".into()) else {
            panic!("expected a model request");
        };
        assert!(request.json_mode);
        assert_eq!(request.json_schema, Some(json!({"type": "string"})));
    }
}
