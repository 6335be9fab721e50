//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the conversation
//! and the remote client, and handles streaming API interactions.

use std::time::Instant;

use futures::StreamExt;

use crate::chat::config::ChatConfig;
use crate::error::{Error, Result};
use crate::observability::{
    CHAT_INGESTED, CHAT_TURN_ERRORS, CHAT_TURNS, STREAM_DURATION, STREAM_TTFB,
};
use crate::render::Renderer;
use crate::types::{Content, GenerateContentRequest, GenerationConfig, SafetySetting};
use crate::Gemini;

/// Model turn recorded after content is loaded into the conversation.
pub const ACKNOWLEDGEMENT: &str = "Thank you for the context. What would you like to know?";

/// Finish reasons that mean the reply was withheld by a content filter.
const FILTERED_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Lifecycle of a [`ChatSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created but not yet connected.
    Uninitialized,
    /// Connected and accepting turns.
    Ready,
    /// Closed; the client has been released.
    Closed,
}

/// A chat session that manages conversation state and API interactions.
///
/// The session maintains the turn history and handles streaming responses
/// from the Gemini API. History only ever holds complete user/model pairs.
pub struct ChatSession {
    config: ChatConfig,
    client: Option<Gemini>,
    history: Vec<Content>,
    state: SessionState,
}

impl ChatSession {
    /// Creates a new, uninitialized chat session.
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            client: None,
            history: Vec::new(),
            state: SessionState::Uninitialized,
        }
    }

    /// Validates the configuration and connects the session.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error naming the first unset setting, with
    /// an authentication or HTTP client error if the client cannot be built,
    /// or with a state error if the session is not uninitialized.
    pub fn initialize(&mut self) -> Result<()> {
        self.check_uninitialized()?;
        self.config.validate()?;
        let client = Gemini::with_options(
            self.config.api_key.clone(),
            self.config.base_url.clone(),
            None,
        )?;
        self.initialize_with_client(client)
    }

    /// Connects the session using an already built client.
    ///
    /// This is how a client carrying a [`ClientLogger`](crate::ClientLogger)
    /// is attached to a session.
    pub fn initialize_with_client(&mut self, client: Gemini) -> Result<()> {
        self.check_uninitialized()?;
        self.client = Some(client);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Adds the user message to history
    /// 2. Sends a streaming request to the API
    /// 3. Renders response chunks as they arrive
    /// 4. Adds the complete model response to history
    ///
    /// When any step fails, history is restored to what it was before the call.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is not ready, the request fails, the
    /// stream fails part way, or the prompt is blocked.
    pub async fn send_streaming(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        let client = self.ready_client()?.clone();
        let previous_len = self.history.len();

        self.history.push(Content::user(user_input));
        CHAT_TURNS.click();

        match self.stream_reply(&client, renderer).await {
            Ok(reply) => {
                self.history.push(Content::model(reply));
                Ok(())
            }
            Err(err) => {
                CHAT_TURN_ERRORS.click();
                self.history.truncate(previous_len);
                Err(err)
            }
        }
    }

    /// Adds loaded content to the conversation without contacting the model.
    ///
    /// The content becomes a user turn and is followed by a canned
    /// acknowledgement from the model.
    pub fn ingest_content(&mut self, content: impl Into<String>) -> Result<()> {
        self.ready_client()?;
        self.history.push(Content::user(content));
        self.history.push(Content::model(ACKNOWLEDGEMENT));
        CHAT_INGESTED.click();
        Ok(())
    }

    /// Releases the client. Safe to call more than once, and a no-op when the
    /// session was never initialized.
    pub fn close(&mut self) {
        if self.state == SessionState::Ready {
            self.client = None;
            self.state = SessionState::Closed;
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the conversation so far.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Returns the number of turns in the conversation.
    pub fn message_count(&self) -> usize {
        self.history.len()
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn check_uninitialized(&self) -> Result<()> {
        match self.state {
            SessionState::Uninitialized => Ok(()),
            SessionState::Ready => Err(Error::state("session is already initialized")),
            SessionState::Closed => Err(Error::state("session is closed")),
        }
    }

    fn ready_client(&self) -> Result<&Gemini> {
        match (self.state, &self.client) {
            (SessionState::Ready, Some(client)) => Ok(client),
            (SessionState::Closed, _) => Err(Error::state("session is closed")),
            _ => Err(Error::state("session is not initialized")),
        }
    }

    fn build_request(&self) -> GenerateContentRequest {
        GenerateContentRequest::new(self.history.clone())
            .with_safety_settings(SafetySetting::block_none())
            .with_generation_config(GenerationConfig::new(
                self.config.temperature,
                self.config.max_output_tokens,
                self.config.top_k,
                self.config.top_p,
            ))
    }

    /// Streams one reply into the renderer and returns its full text.
    async fn stream_reply(&self, client: &Gemini, renderer: &mut dyn Renderer) -> Result<String> {
        let request = self.build_request();
        let start = Instant::now();
        let stream = client.stream(&self.config.model, &request).await?;
        futures::pin_mut!(stream);

        let mut reply = String::new();
        let mut finish_reason: Option<String> = None;
        let mut first_chunk = true;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    renderer.finish_response();
                    return Err(err);
                }
            };
            if first_chunk {
                STREAM_TTFB.add(start.elapsed().as_secs_f64());
                first_chunk = false;
            }
            if let Some(reason) = chunk.block_reason() {
                renderer.finish_response();
                return Err(Error::blocked(reason));
            }

            let text = chunk.text();
            if !text.is_empty() {
                renderer.print_text(&text);
                reply.push_str(&text);
            }
            if let Some(reason) = chunk
                .candidates
                .iter()
                .find_map(|candidate| candidate.finish_reason.clone())
            {
                finish_reason = Some(reason);
            }
        }

        renderer.finish_response();
        STREAM_DURATION.add(start.elapsed().as_secs_f64());

        if let Some(reason) = finish_reason
            .as_deref()
            .filter(|reason| FILTERED_FINISH_REASONS.contains(reason))
        {
            return Err(Error::blocked(reason));
        }
        if reply.is_empty() {
            let message = match finish_reason {
                Some(reason) => format!("model returned an empty response ({reason})"),
                None => "model returned an empty response".to_string(),
            };
            return Err(Error::streaming(message, None));
        }

        if let Some(logger) = client.logger() {
            logger.log_stream_complete(&reply);
        }
        Ok(reply)
    }
}
