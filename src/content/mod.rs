//! Content fetchers.
//!
//! A fetcher turns a local file or a web page into a single text blob made of
//! a human-readable label followed by the source's text. The blob is meant to
//! be injected into a conversation as context.

mod file;
mod html;
mod url;

pub use file::fetch_file;
pub use html::html_to_text;
pub use self::url::{CLIENT_AGENT, UrlFetcher};
