//! Chat application module for interactive conversations with Gemini.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! aictl client library. It supports:
//!
//! - Streaming responses with real-time token display
//! - Loading local files and web pages into the conversation
//! - Configuration from flags, the environment and defaults
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Core chat session management and API interaction
//! - [`commands`]: Input line parsing
//! - [`shell`]: The read loop tying input, fetchers and the session together
//! - [`terminal`]: Restoring terminal settings on an early exit

mod commands;
mod config;
mod session;
mod shell;
mod terminal;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{FILE_MARKER, ShellCommand, URL_MARKER, parse_command};
pub use config::{API_KEY_ENV_VAR, ChatArgs, ChatConfig, DEFAULT_MODEL};
pub use session::{ACKNOWLEDGEMENT, ChatSession, SessionState};
pub use shell::{
    FOLLOW_UP, GREETING, INPUT_PROMPT, LineSource, Outcome, ReaderSource, Shell,
    run_until_interrupted,
};
pub use terminal::TerminalMode;
