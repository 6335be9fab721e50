//! The interactive read-eval loop.
//!
//! [`Shell`] reads lines from a [`LineSource`], loads files and web pages into
//! the conversation, and streams model replies to a [`Renderer`].

use std::future::Future;
use std::io::{self, BufRead};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::Notify;

use crate::chat::commands::{ShellCommand, parse_command};
use crate::chat::session::ChatSession;
use crate::content::{UrlFetcher, fetch_file};
use crate::error::{Error, Result};
use crate::render::Renderer;

/// Printed once when the shell starts.
pub const GREETING: &str = "How can I help?";

/// Printed after every handled line.
pub const FOLLOW_UP: &str = "Anything else?";

/// Prompt shown by interactive line editors.
pub const INPUT_PROMPT: &str = "> ";

/// A source of input lines.
pub trait LineSource {
    /// Reads the next line without its terminator.
    ///
    /// Returns `Ok(None)` when the input is exhausted or the user asked to
    /// leave (Ctrl-D or Ctrl-C at the prompt).
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Io(err)) => Err(Error::io("error scanning input", err)),
            Err(err) => Err(Error::io(
                "error scanning input",
                io::Error::other(err.to_string()),
            )),
        }
    }
}

/// Reads lines from any buffered reader, such as piped stdin.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Ok(Some(line))
            }
            Err(err) => Err(Error::io("error scanning input", err)),
        }
    }
}

/// Whether the loop should keep reading.
enum Flow {
    Continue,
    Stop,
}

/// Drives a chat session from line-oriented input.
pub struct Shell {
    session: ChatSession,
    fetcher: UrlFetcher,
}

impl Shell {
    /// Creates a shell around a session, with a default URL fetcher.
    pub fn new(session: ChatSession) -> Result<Self> {
        Ok(Self::with_fetcher(session, UrlFetcher::new()?))
    }

    /// Creates a shell around a session with the given URL fetcher.
    pub fn with_fetcher(session: ChatSession, fetcher: UrlFetcher) -> Self {
        Self { session, fetcher }
    }

    /// Returns the session this shell drives.
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Runs the loop until an empty line, the end of input, or a read error.
    ///
    /// Failed fetches and failed turns are reported and the loop continues.
    /// The session is closed when the loop ends.
    pub async fn run(&mut self, input: &mut dyn LineSource, renderer: &mut dyn Renderer) {
        renderer.print_info(GREETING);

        loop {
            let Some(line) = read_or_report(input, renderer) else {
                break;
            };

            let flow = match parse_command(&line) {
                ShellCommand::Quit => break,
                ShellCommand::File(path) => self.load(&path, false, input, renderer).await,
                ShellCommand::Url(url) => self.load(&url, true, input, renderer).await,
                ShellCommand::Message(text) => {
                    if let Err(err) = self.session.send_streaming(&text, renderer).await {
                        renderer.print_error(&turn_error_message(&err));
                    }
                    Flow::Continue
                }
                ShellCommand::Invalid(message) => {
                    renderer.print_error(&message);
                    Flow::Continue
                }
            };

            if let Flow::Stop = flow {
                break;
            }
            renderer.print_info(FOLLOW_UP);
        }

        self.session.close();
    }

    /// Asks for a description of `source`, fetches it, and adds it to the
    /// conversation.
    async fn load(
        &mut self,
        source: &str,
        is_url: bool,
        input: &mut dyn LineSource,
        renderer: &mut dyn Renderer,
    ) -> Flow {
        renderer.print_info(&format!("Describe content of {source}:"));
        let Some(label) = read_or_report(input, renderer) else {
            return Flow::Stop;
        };

        let fetched = if is_url {
            self.fetcher.fetch_url(&label, source).await
        } else {
            fetch_file(&label, source)
        };

        match fetched.and_then(|content| self.session.ingest_content(content)) {
            Ok(()) => renderer.print_success(&format!("Loaded {source}")),
            Err(err) => renderer.print_error(&err.to_string()),
        }
        Flow::Continue
    }
}

/// How [`run_until_interrupted`] ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The task ran to completion with this output.
    Finished(T),
    /// The interrupt fired first; the task was dropped unfinished.
    Interrupted,
}

/// Waits for `task` or for `interrupt` to be notified, whichever comes first.
///
/// The task is not asked to stop; when the interrupt wins it is simply
/// dropped, and anything it was waiting on is abandoned.
pub async fn run_until_interrupted<F: Future>(task: F, interrupt: &Notify) -> Outcome<F::Output> {
    tokio::select! {
        output = task => Outcome::Finished(output),
        _ = interrupt.notified() => Outcome::Interrupted,
    }
}

/// Formats a failed turn for the user. Errors that no retry will fix get a
/// pointer to the settings.
fn turn_error_message(err: &Error) -> String {
    if err.is_fatal() {
        format!("error processing your prompt: {err} (check the API key and settings)")
    } else {
        format!("error processing your prompt: {err}")
    }
}

fn read_or_report(input: &mut dyn LineSource, renderer: &mut dyn Renderer) -> Option<String> {
    match input.read_line(INPUT_PROMPT) {
        Ok(line) => line,
        Err(err) => {
            renderer.print_error(&err.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::config::ChatConfig;
    use crate::chat::session::SessionState;
    use std::io::{Cursor, Write};

    #[derive(Default)]
    struct RecordingRenderer {
        info: Vec<String>,
        errors: Vec<String>,
    }

    impl Renderer for RecordingRenderer {
        fn print_text(&mut self, _: &str) {}

        fn print_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }

        fn print_info(&mut self, info: &str) {
            self.info.push(info.to_string());
        }

        fn finish_response(&mut self) {}
    }

    struct FailingSource;

    impl LineSource for FailingSource {
        fn read_line(&mut self, _: &str) -> Result<Option<String>> {
            Err(Error::io(
                "error scanning input",
                io::Error::new(io::ErrorKind::BrokenPipe, "gone"),
            ))
        }
    }

    fn ready_shell() -> Shell {
        let mut session = ChatSession::new(ChatConfig::new().with_api_key("key"));
        session.initialize().unwrap();
        Shell::new(session).unwrap()
    }

    #[tokio::test]
    async fn interrupt_ends_pending_task() {
        let interrupt = Notify::new();
        interrupt.notify_one();

        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            run_until_interrupted(futures::future::pending::<()>(), &interrupt),
        )
        .await
        .unwrap();
        assert_eq!(outcome, Outcome::Interrupted);
    }

    #[tokio::test]
    async fn interrupt_during_task() {
        let interrupt = std::sync::Arc::new(Notify::new());
        let notifier = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            notifier.notify_one();
        });

        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            run_until_interrupted(futures::future::pending::<()>(), &interrupt),
        )
        .await
        .unwrap();
        assert_eq!(outcome, Outcome::Interrupted);
    }

    #[tokio::test]
    async fn finished_task_reports_output() {
        let interrupt = Notify::new();
        let outcome = run_until_interrupted(async { 7 }, &interrupt).await;
        assert_eq!(outcome, Outcome::Finished(7));
    }

    #[test]
    fn reader_source_strips_terminators() {
        let mut source = ReaderSource::new(Cursor::new("one\r\ntwo\nthree"));
        assert_eq!(source.read_line("").unwrap().as_deref(), Some("one"));
        assert_eq!(source.read_line("").unwrap().as_deref(), Some("two"));
        assert_eq!(source.read_line("").unwrap().as_deref(), Some("three"));
        assert_eq!(source.read_line("").unwrap(), None);
    }

    #[tokio::test]
    async fn blank_line_ends_session() {
        let mut shell = ready_shell();
        let mut input = ReaderSource::new(Cursor::new("\nnever read\n"));
        let mut renderer = RecordingRenderer::default();

        shell.run(&mut input, &mut renderer).await;

        assert_eq!(renderer.info, vec![GREETING]);
        assert!(renderer.errors.is_empty());
        assert_eq!(shell.session().state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn file_is_ingested_with_description() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "alpha\nbeta\n").unwrap();
        let path = file.path().display().to_string();

        let mut shell = ready_shell();
        let script = format!("FILE:{path}\nquarterly numbers\n\n");
        let mut input = ReaderSource::new(Cursor::new(script));
        let mut renderer = RecordingRenderer::default();

        shell.run(&mut input, &mut renderer).await;

        assert!(renderer.errors.is_empty(), "{:?}", renderer.errors);
        assert_eq!(
            renderer.info,
            vec![
                GREETING.to_string(),
                format!("Describe content of {path}:"),
                format!("Loaded {path}"),
                FOLLOW_UP.to_string(),
            ]
        );
        let history = shell.session().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text(), "quarterly numbers\nalpha\nbeta\n");
    }

    #[tokio::test]
    async fn description_is_kept_as_typed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "data").unwrap();
        let path = file.path().display().to_string();

        let mut shell = ready_shell();
        let script = format!("FILE:{path}\n  sales, Q3 \nFILE:{path}\n\n\n");
        let mut input = ReaderSource::new(Cursor::new(script));
        let mut renderer = RecordingRenderer::default();

        shell.run(&mut input, &mut renderer).await;

        let history = shell.session().history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].text(), "  sales, Q3 \ndata\n");
        assert_eq!(history[2].text(), "\ndata\n");
    }

    #[test]
    fn fatal_turn_errors_point_at_settings() {
        let err = Error::authentication("API key not valid");
        assert_eq!(
            turn_error_message(&err),
            "error processing your prompt: Authentication error: API key not valid (check the API key and settings)"
        );

        let err = Error::internal_server("boom");
        assert_eq!(
            turn_error_message(&err),
            "error processing your prompt: Internal server error: boom"
        );
    }

    #[tokio::test]
    async fn failed_fetch_keeps_loop_running() {
        let mut shell = ready_shell();
        let script = "FILE:/definitely/not/here.txt\nmissing\nURL: ftp://example.com\nbad\nFILE:\n\n";
        let mut input = ReaderSource::new(Cursor::new(script));
        let mut renderer = RecordingRenderer::default();

        shell.run(&mut input, &mut renderer).await;

        assert_eq!(renderer.errors.len(), 3, "{:?}", renderer.errors);
        assert!(renderer.errors[0].starts_with("error opening file: /definitely/not/here.txt"));
        assert_eq!(renderer.errors[1], "invalid url ftp://example.com");
        assert_eq!(
            renderer.info.iter().filter(|i| *i == FOLLOW_UP).count(),
            3
        );
        assert_eq!(shell.session().message_count(), 0);
    }

    #[tokio::test]
    async fn read_error_ends_loop() {
        let mut shell = ready_shell();
        let mut renderer = RecordingRenderer::default();

        shell.run(&mut FailingSource, &mut renderer).await;

        assert_eq!(renderer.errors.len(), 1);
        assert!(renderer.errors[0].contains("error scanning input"));
        assert_eq!(shell.session().state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn end_of_input_while_describing_ends_loop() {
        let mut shell = ready_shell();
        let mut input = ReaderSource::new(Cursor::new("FILE:notes.txt\n"));
        let mut renderer = RecordingRenderer::default();

        shell.run(&mut input, &mut renderer).await;

        assert!(renderer.errors.is_empty());
        assert_eq!(shell.session().message_count(), 0);
        assert_eq!(shell.session().state(), SessionState::Closed);
    }
}
