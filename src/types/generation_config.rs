use serde::{Deserialize, Serialize};

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Randomness of the generated text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Upper bound on the number of tokens in a reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Number of highest-probability tokens considered at each step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Cumulative probability cutoff for nucleus sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl GenerationConfig {
    /// Create a config with every sampling parameter set.
    pub fn new(temperature: f32, max_output_tokens: u32, top_k: u32, top_p: f32) -> Self {
        Self {
            temperature: Some(temperature),
            max_output_tokens: Some(max_output_tokens),
            top_k: Some(top_k),
            top_p: Some(top_p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn generation_config_uses_camel_case() {
        let config = GenerationConfig::new(0.5, 100, 40, 0.25);
        assert_eq!(
            to_value(&config).unwrap(),
            json!({
                "temperature": 0.5,
                "maxOutputTokens": 100,
                "topK": 40,
                "topP": 0.25
            })
        );
    }

    #[test]
    fn empty_generation_config() {
        assert_eq!(to_value(GenerationConfig::default()).unwrap(), json!({}));
    }
}
