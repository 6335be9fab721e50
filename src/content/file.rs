use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::observability::{CONTENT_FILE_ERRORS, CONTENT_FILE_READS};

/// Read a file into a labelled text blob.
///
/// The result is `label`, a newline, then every line of the file each followed
/// by a newline. Line terminators (`\n` or `\r\n`) are normalized to `\n`.
///
/// # Errors
///
/// Fails with [`Error::Io`] if the file cannot be opened or any read fails,
/// including when the file is not valid UTF-8. Nothing is returned on a
/// partial read.
pub fn fetch_file(label: &str, path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    CONTENT_FILE_READS.click();
    read_lines(label, path).inspect_err(|_| CONTENT_FILE_ERRORS.click())
}

fn read_lines(label: &str, path: &Path) -> Result<String> {
    let file = File::open(path)
        .map_err(|err| Error::io(format!("error opening file: {}", path.display()), err))?;

    let mut content = String::with_capacity(label.len() + 1);
    content.push_str(label);
    content.push('\n');

    for line in BufReader::new(file).lines() {
        let line = line
            .map_err(|err| Error::io(format!("error scanning file: {}", path.display()), err))?;
        content.push_str(&line);
        content.push('\n');
    }

    Ok(content)
}
