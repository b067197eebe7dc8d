//! Spawns `$EDITOR` on a temp copy of a message's content for the
//! "edit in editor" command.

use std::env;
use std::fs;
use std::io::Write as _;
use std::process::Command;

use tempfile::Builder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("EDITOR environment variable is not set")]
    NoEditor,
    #[error("failed to create temp file: {0}")]
    TempFile(#[source] std::io::Error),
    #[error("failed to launch editor {0:?}: {1}")]
    Spawn(String, #[source] std::io::Error),
    #[error("editor exited with a failure status")]
    EditorFailed,
    #[error("failed to read back edited content: {0}")]
    ReadBack(#[source] std::io::Error),
}

/// Writes `content` to a fresh `hexdump*.bin` temp file, blocks on `$EDITOR`
/// editing it, then reads the result back. The temp file is removed when
/// this function returns (it's a `NamedTempFile` under the hood).
pub fn edit_in_external_editor(content: &[u8]) -> Result<Vec<u8>, EditorError> {
    let editor = env::var("EDITOR").map_err(|_| EditorError::NoEditor)?;

    let mut file = Builder::new()
        .prefix("hexdump")
        .suffix(".bin")
        .tempfile()
        .map_err(EditorError::TempFile)?;
    file.write_all(content).map_err(EditorError::TempFile)?;
    file.flush().map_err(EditorError::TempFile)?;
    let path = file.path().to_path_buf();

    let status = Command::new(&editor)
        .arg(&path)
        .status()
        .map_err(|e| EditorError::Spawn(editor.clone(), e))?;
    if !status.success() {
        return Err(EditorError::EditorFailed);
    }

    fs::read(&path).map_err(EditorError::ReadBack)
}
