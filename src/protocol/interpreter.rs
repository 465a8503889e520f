//! Command interpreter
//!
//! Executes one parsed command against the shared tree and renders the
//! response line. Per-request failures become response strings here; only
//! the worker's own stream errors terminate a connection.

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::sync::{CancelToken, Cancelled};
use crate::tree::Tree;

use super::command::{parse, Command};

const ILL_FORMED: &str = "ill-formed command";

/// Interpret one command line and produce the response string.
///
/// Returns `Err(Cancelled)` only when the worker's token fires during
/// batch-file processing, which is the one long-running operation with an
/// explicit cancellation point.
pub fn interpret_command(
    tree: &Tree,
    token: &CancelToken,
    line: &str,
) -> Result<String, Cancelled> {
    let Some(command) = parse(line) else {
        return Ok(ILL_FORMED.to_string());
    };

    match command {
        Command::Query { name } => Ok(tree
            .query(&name)
            .unwrap_or_else(|| "not found".to_string())),
        Command::Add { name, value } => Ok(match tree.add(&name, &value) {
            Ok(true) => "added",
            Ok(false) => "already in database",
            Err(_) => ILL_FORMED,
        }
        .to_string()),
        Command::Remove { name } => Ok(if tree.remove(&name) {
            "removed"
        } else {
            "not in database"
        }
        .to_string()),
        Command::BatchFile { path } => process_file(tree, token, &path),
    }
}

/// Run every line of a file through the interpreter, discarding the
/// intermediate responses. The token is checked after each read so a
/// worker cancelled mid-batch exits promptly.
fn process_file(tree: &Tree, token: &CancelToken, path: &str) -> Result<String, Cancelled> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            tracing::debug!(path, %error, "batch file open failed");
            return Ok("bad file name".to_string());
        }
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                tracing::debug!(path, %error, "batch file read failed");
                break;
            }
        }
        if token.is_cancelled() {
            return Err(Cancelled);
        }
        let line = String::from_utf8_lossy(&buf);
        interpret_command(tree, token, line.trim_end())?;
    }

    Ok("file processed".to_string())
}
