//! Logging trait for Gemini client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`Gemini`](crate::Gemini) client.

use crate::{GenerateContentRequest, GenerateContentResponse};

/// A trait for logging Gemini client operations.
///
/// Implement this trait to capture and record all API interactions,
/// including the outgoing request and every streamed chunk.
///
/// # Example
///
/// ```rust,ignore
/// use aictl::{ClientLogger, GenerateContentRequest, GenerateContentResponse};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, model: &str, request: &GenerateContentRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Request to {model}: {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
///
///     fn log_stream_chunk(&self, chunk: &GenerateContentResponse) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Chunk: {}", serde_json::to_string(chunk).unwrap()).unwrap();
///     }
///
///     fn log_stream_complete(&self, text: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Stream complete: {text}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, model: &str, request: &GenerateContentRequest);

    /// Log an individual streamed chunk.
    ///
    /// This method is called for each chunk received during a streaming
    /// request, in arrival order.
    fn log_stream_chunk(&self, chunk: &GenerateContentResponse);

    /// Log the full reply text once a stream completes successfully.
    fn log_stream_complete(&self, text: &str);
}
