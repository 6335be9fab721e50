//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration a chat session runs with. Values come from, in order of
//! precedence: an explicit flag, the `API_KEY` environment variable (API key
//! only), and built-in defaults.

use std::fmt;
use std::str::FromStr;

use arrrg_derive::CommandLine;

use crate::error::{Error, Result};

/// Environment variable consulted when `--api-key` is not given.
pub const API_KEY_ENV_VAR: &str = "API_KEY";

/// Model used when `--model` is not given.
pub const DEFAULT_MODEL: &str = "gemini-pro";

const API_KEY_FLAG: &str = "api-key";
const TEMPERATURE_FLAG: &str = "temperature";
const MAX_TOKENS_FLAG: &str = "tokens";
const TOP_K_FLAG: &str = "top-k";
const TOP_P_FLAG: &str = "top-p";
const MODEL_FLAG: &str = "model";

const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: u32 = 100;
const DEFAULT_TOP_K: u32 = 40;
const DEFAULT_TOP_P: f32 = 0.95;

/// Command-line arguments for the aictl tool.
///
/// Numeric values are kept as text so that a malformed value can be reported
/// with the name of the flag it came from.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// API key for the generative language API.
    #[arrrg(optional, "API key (default: $API_KEY)", "KEY")]
    pub api_key: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature in (0, 2] (default: 0.2)", "TEMP")]
    pub temperature: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: 100)", "TOKENS")]
    pub tokens: Option<String>,

    /// Top-k sampling limit.
    #[arrrg(optional, "Top-k sampling limit (default: 40)", "K")]
    pub top_k: Option<String>,

    /// Top-p nucleus sampling value.
    #[arrrg(optional, "Top-p nucleus sampling in (0, 1] (default: 0.95)", "P")]
    pub top_p: Option<String>,

    /// Model to chat with.
    #[arrrg(optional, "Model to use (default: gemini-pro)", "MODEL")]
    pub model: Option<String>,

    /// Alternate API endpoint.
    #[arrrg(optional, "API base URL (default: generativelanguage.googleapis.com)", "URL")]
    pub base_url: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Print version information and exit.
    #[arrrg(flag, "Show version info")]
    pub info: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments and the environment with appropriate defaults.
#[derive(Clone, PartialEq)]
pub struct ChatConfig {
    /// API key sent with every request.
    pub api_key: String,

    /// The model to use for generating responses.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens per response.
    pub max_output_tokens: u32,

    /// Top-k sampling limit.
    pub top_k: u32,

    /// Top-p nucleus sampling value.
    pub top_p: f32,

    /// Alternate API endpoint; `None` uses the public one.
    pub base_url: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values and no API key.
    ///
    /// Defaults:
    /// - Model: gemini-pro
    /// - Temperature: 0.2
    /// - Max tokens: 100
    /// - Top-k: 40
    /// - Top-p: 0.95
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_TOKENS,
            top_k: DEFAULT_TOP_K,
            top_p: DEFAULT_TOP_P,
            base_url: None,
            use_color: true,
        }
    }

    /// Resolves a configuration from parsed flags and the process environment.
    pub fn resolve(args: ChatArgs) -> Result<Self> {
        Self::resolve_with(args, std::env::var(API_KEY_ENV_VAR).ok())
    }

    /// Resolves a configuration from parsed flags and an API key taken from
    /// the environment, if any.
    ///
    /// An empty or zero flag value counts as unset. This does not check that
    /// the result is complete; see [`ChatConfig::validate`].
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Config`] naming the flag whose value cannot be parsed.
    pub fn resolve_with(args: ChatArgs, env_api_key: Option<String>) -> Result<Self> {
        let defaults = Self::new();
        let api_key = non_empty(args.api_key)
            .or_else(|| non_empty(env_api_key))
            .unwrap_or_default();

        Ok(Self {
            api_key,
            model: non_empty(args.model).unwrap_or(defaults.model),
            temperature: parse_flag(TEMPERATURE_FLAG, args.temperature.as_deref())?
                .unwrap_or(defaults.temperature),
            max_output_tokens: parse_flag(MAX_TOKENS_FLAG, args.tokens.as_deref())?
                .unwrap_or(defaults.max_output_tokens),
            top_k: parse_flag(TOP_K_FLAG, args.top_k.as_deref())?.unwrap_or(defaults.top_k),
            top_p: parse_flag(TOP_P_FLAG, args.top_p.as_deref())?.unwrap_or(defaults.top_p),
            base_url: non_empty(args.base_url),
            use_color: !args.no_color,
        })
    }

    /// Checks that every required setting is present and in range.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Config`] naming the first of api-key, temperature
    /// and tokens that is unset, or the first setting that is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::missing_field(API_KEY_FLAG));
        }
        if self.temperature == 0.0 {
            return Err(Error::missing_field(TEMPERATURE_FLAG));
        }
        if self.max_output_tokens == 0 {
            return Err(Error::missing_field(MAX_TOKENS_FLAG));
        }
        if self.model.trim().is_empty() {
            return Err(Error::missing_field(MODEL_FLAG));
        }
        if !(self.temperature > 0.0 && self.temperature <= 2.0) {
            return Err(Error::invalid_config(
                TEMPERATURE_FLAG,
                format!("temperature must be in (0, 2], got {}", self.temperature),
            ));
        }
        if self.top_k == 0 {
            return Err(Error::invalid_config(TOP_K_FLAG, "top-k must be positive"));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(Error::invalid_config(
                TOP_P_FLAG,
                format!("top-p must be in (0, 1], got {}", self.top_p),
            ));
        }
        Ok(())
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Sets the top-k value.
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the top-p value.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Sets an alternate API endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("ChatConfig")
            .field("api_key", &api_key)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("top_k", &self.top_k)
            .field("top_p", &self.top_p)
            .field("base_url", &self.base_url)
            .field("use_color", &self.use_color)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a flag value; a missing, blank or zero value yields `None`.
fn parse_flag<T>(field: &str, value: Option<&str>) -> Result<Option<T>>
where
    T: FromStr + Default + PartialEq,
{
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let parsed = value.parse::<T>().map_err(|_| {
        Error::invalid_config(
            field,
            format!("invalid configuration value for '{field}': {value}"),
        )
    })?;
    Ok(Some(parsed).filter(|v| *v != T::default()))
}
