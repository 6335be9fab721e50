use serde::{Deserialize, Serialize};

use crate::types::{Content, GenerationConfig, SafetySetting};

/// Body of a `generateContent` / `streamGenerateContent` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation so far, oldest turn first.
    pub contents: Vec<Content>,

    /// Per-category blocking thresholds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<SafetySetting>,

    /// Sampling parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Create a request for the given conversation.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            ..Self::default()
        }
    }

    /// Set the safety settings.
    pub fn with_safety_settings(mut self, safety_settings: Vec<SafetySetting>) -> Self {
        self.safety_settings = safety_settings;
        self
    }

    /// Set the sampling parameters.
    pub fn with_generation_config(mut self, generation_config: GenerationConfig) -> Self {
        self.generation_config = Some(generation_config);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn full_request_serialization() {
        let request = GenerateContentRequest::new(vec![
            Content::user("context"),
            Content::model("ack"),
            Content::user("question"),
        ])
        .with_safety_settings(SafetySetting::block_none())
        .with_generation_config(GenerationConfig::new(0.2, 100, 40, 0.5));

        let json = to_value(&request).unwrap();
        assert_eq!(json["contents"].as_array().unwrap().len(), 3);
        assert_eq!(json["contents"][1]["role"], json!("model"));
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], json!(100));
        assert_eq!(json["generationConfig"]["topK"], json!(40));
    }

    #[test]
    fn minimal_request_omits_optional_fields() {
        let request = GenerateContentRequest::new(vec![Content::user("hi")]);
        assert_eq!(
            to_value(&request).unwrap(),
            json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
        );
    }
}
