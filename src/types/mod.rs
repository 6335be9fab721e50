// Public modules
pub mod content;
pub mod generate_content_request;
pub mod generate_content_response;
pub mod generation_config;
pub mod safety_setting;

// Re-exports
pub use content::{Content, Part, Role};
pub use generate_content_request::GenerateContentRequest;
pub use generate_content_response::{
    Candidate, GenerateContentResponse, PromptFeedback, UsageMetadata,
};
pub use generation_config::GenerationConfig;
pub use safety_setting::{HarmBlockThreshold, HarmCategory, SafetySetting};
