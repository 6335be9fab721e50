use serde::{Deserialize, Serialize};

/// Harm categories the remote content filter scores.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmCategory {
    /// Negative or harmful comments targeting identity or protected attributes.
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,

    /// Content that is rude, disrespectful, or profane.
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,

    /// References to sexual acts or other lewd content.
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,

    /// Content that promotes or enables access to harmful goods or activities.
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    /// Every category the client configures.
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];
}

/// Probability level at which content gets blocked.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    /// Always show content regardless of the probability of harm.
    BlockNone,

    /// Block only when the probability of harm is high.
    BlockOnlyHigh,

    /// Block when the probability of harm is medium or high.
    BlockMediumAndAbove,

    /// Block when the probability of harm is low, medium, or high.
    BlockLowAndAbove,
}

/// A blocking threshold for one harm category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    /// The category this setting applies to.
    pub category: HarmCategory,

    /// The threshold applied to the category.
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// Create a new safety setting.
    pub fn new(category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        Self {
            category,
            threshold,
        }
    }

    /// The relaxed policy the chat session runs with: nothing is blocked.
    pub fn block_none() -> Vec<SafetySetting> {
        HarmCategory::ALL
            .iter()
            .map(|category| SafetySetting::new(*category, HarmBlockThreshold::BlockNone))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn block_none_covers_every_category() {
        let settings = SafetySetting::block_none();
        assert_eq!(settings.len(), 4);
        assert!(
            settings
                .iter()
                .all(|s| s.threshold == HarmBlockThreshold::BlockNone)
        );
        assert_eq!(
            to_value(&settings).unwrap(),
            json!([
                {"category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE"},
                {"category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_NONE"},
                {"category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE"},
                {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE"}
            ])
        );
    }

    #[test]
    fn threshold_names() {
        assert_eq!(
            to_value(HarmBlockThreshold::BlockMediumAndAbove).unwrap(),
            json!("BLOCK_MEDIUM_AND_ABOVE")
        );
    }
}
