//! Input line parsing for the chat shell.
//!
//! A line is either a request to end the session, a request to load a file or
//! web page into the conversation, or a message for the model.

/// Marker that introduces a local file path.
pub const FILE_MARKER: &str = "FILE:";

/// Marker that introduces a web page address.
pub const URL_MARKER: &str = "URL:";

/// A parsed line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// End the session.
    Quit,

    /// Load the file at this path into the conversation.
    File(String),

    /// Fetch the page at this address into the conversation.
    Url(String),

    /// Send this text to the model.
    Message(String),

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses one line of user input.
///
/// Only an empty line ends the session. Markers are matched case-sensitively
/// after any leading whitespace, and the path or URL that follows is trimmed.
/// Anything else is a message and is kept exactly as typed.
///
/// # Examples
///
/// ```
/// # use aictl::chat::{ShellCommand, parse_command};
/// assert_eq!(parse_command(""), ShellCommand::Quit);
/// assert_eq!(parse_command("FILE: notes.txt"), ShellCommand::File("notes.txt".into()));
/// assert_eq!(parse_command("hello"), ShellCommand::Message("hello".into()));
/// ```
pub fn parse_command(input: &str) -> ShellCommand {
    if input.is_empty() {
        return ShellCommand::Quit;
    }

    let trimmed = input.trim_start();
    if let Some(path) = trimmed.strip_prefix(FILE_MARKER) {
        return match path.trim() {
            "" => ShellCommand::Invalid(format!("{FILE_MARKER} requires a file path")),
            path => ShellCommand::File(path.to_string()),
        };
    }

    if let Some(url) = trimmed.strip_prefix(URL_MARKER) {
        return match url.trim() {
            "" => ShellCommand::Invalid(format!("{URL_MARKER} requires a URL")),
            url => ShellCommand::Url(url.to_string()),
        };
    }

    ShellCommand::Message(input.to_string())
}
