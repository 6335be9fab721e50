//! A terminal chat client for the Gemini generative language API.
//!
//! The library exposes the pieces the `aictl` binary is built from: a
//! streaming [`Gemini`] client, file and web page fetchers in [`content`], and
//! the interactive [`chat`] session and shell.

// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod content;
pub mod error;
pub mod render;
pub mod sse;
pub mod types;

mod observability;

// Re-exports
pub use client::Gemini;
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
