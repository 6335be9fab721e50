//! Interactive chat application for conversing with Gemini.
//!
//! This binary provides a streaming REPL interface for chatting with Gemini
//! models, with the ability to load local files and web pages as context.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage, with the key taken from $API_KEY
//! aictl
//!
//! # Tune sampling
//! aictl --api-key KEY --temperature 0.7 --tokens 512 --top-k 20 --top-p 0.9
//!
//! # Disable colors (useful for piping output)
//! aictl --no-color
//! ```
//!
//! # Input
//!
//! - `FILE:<path>` loads a local file into the conversation
//! - `URL:<address>` loads the text of a web page into the conversation
//! - an empty line ends the session
//! - anything else is sent to the model

use std::process::ExitCode;
use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::Notify;

use aictl::chat::{
    ChatArgs, ChatConfig, ChatSession, Outcome, PlainTextRenderer, Renderer, Shell, TerminalMode,
    run_until_interrupted,
};

fn main() -> ExitCode {
    let (args, _) = ChatArgs::from_command_line_relaxed("aictl [OPTIONS]");
    if args.info {
        println!("aictl (version: {})", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let mut renderer = PlainTextRenderer::with_color(!args.no_color);
    let config = match ChatConfig::resolve(args) {
        Ok(config) => config,
        Err(err) => {
            renderer.print_error(&format!("error initializing chat: {err}"));
            return ExitCode::FAILURE;
        }
    };
    let use_color = config.use_color;

    let mut session = ChatSession::new(config);
    if let Err(err) = session.initialize() {
        renderer.print_error(&format!("error initializing chat: {err}"));
        return ExitCode::FAILURE;
    }
    let mut shell = match Shell::new(session) {
        Ok(shell) => shell,
        Err(err) => {
            renderer.print_error(&format!("error starting chat: {err}"));
            return ExitCode::FAILURE;
        }
    };

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            renderer.print_error(&format!("error starting chat: {err}"));
            return ExitCode::FAILURE;
        }
    };

    // Set up Ctrl+C / SIGTERM handler
    let interrupted = Arc::new(Notify::new());
    let notify = Arc::clone(&interrupted);
    if let Err(err) = ctrlc::set_handler(move || notify.notify_one()) {
        renderer.print_error(&format!("error starting chat: {err}"));
        return ExitCode::FAILURE;
    }

    let terminal = TerminalMode::capture();
    let code = runtime.block_on(async move {
        let handle = Handle::current();
        let repl = tokio::task::spawn_blocking(move || -> Result<(), String> {
            let mut renderer = PlainTextRenderer::with_color(use_color);
            let mut editor = DefaultEditor::new().map_err(|err| err.to_string())?;
            handle.block_on(shell.run(&mut editor, &mut renderer));
            Ok(())
        });

        match run_until_interrupted(repl, &interrupted).await {
            Outcome::Finished(Ok(Ok(()))) => ExitCode::SUCCESS,
            Outcome::Finished(Ok(Err(err))) => {
                renderer.print_error(&format!("error starting chat: {err}"));
                ExitCode::FAILURE
            }
            Outcome::Finished(Err(err)) => {
                renderer.print_error(&format!("chat ended unexpectedly: {err}"));
                ExitCode::FAILURE
            }
            Outcome::Interrupted => {
                // The editor may still hold the terminal in raw mode.
                if let Err(err) = terminal.restore() {
                    renderer.print_error(&err.to_string());
                }
                renderer.finish_response();
                println!();
                ExitCode::SUCCESS
            }
        }
    });

    // The loop may still be blocked on input or a request; do not wait for it.
    runtime.shutdown_background();
    code
}
