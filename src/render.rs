//! Output rendering for the chat shell.
//!
//! This module provides the renderer trait the chat session streams into and a
//! plain-text implementation for the terminal.

use std::io::{self, Stdout, Write};

/// ANSI escape code for green text (used for confirmations).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for dim text (used for prompts).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Trait for rendering streaming output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send {
    /// Print a chunk of response text.
    ///
    /// This is called incrementally as chunks are streamed from the API.
    fn print_text(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message, such as a prompt for more input.
    fn print_info(&mut self, info: &str);

    /// Print a confirmation that an action succeeded.
    fn print_success(&mut self, message: &str) {
        self.print_info(message);
    }

    /// Called when a response is complete.
    ///
    /// Used to ensure proper newlines after streaming.
    fn finish_response(&mut self);
}

/// Plain text renderer with optional ANSI styling.
///
/// Response text goes to stdout unstyled and is flushed chunk by chunk; errors
/// go to stderr.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    line_start: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            line_start: true,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    /// Ends a partially written line so the next message starts clean.
    fn break_line(&mut self) {
        if !self.line_start {
            println!();
            self.line_start = true;
        }
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        print!("{text}");
        self.line_start = text.ends_with('\n');
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.break_line();
        self.flush();
        eprintln!("{}", self.styled(ANSI_RED, error));
    }

    fn print_info(&mut self, info: &str) {
        self.break_line();
        println!("{}", self.styled(ANSI_DIM, info));
        self.flush();
    }

    fn print_success(&mut self, message: &str) {
        self.break_line();
        println!("{}", self.styled(ANSI_GREEN, message));
        self.flush();
    }

    fn finish_response(&mut self) {
        self.break_line();
        self.flush();
    }
}
