//! Line-oriented input files (account lists, proxy lists) and append-only exports.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read a file as trimmed lines, keeping blank lines so line numbers stay meaningful.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>, FileError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.lines().map(|l| l.trim().to_string()).collect())
}

/// Append `line` plus a newline, creating the file if needed.
pub fn append_line(path: impl AsRef<Path>, line: &str) -> Result<(), FileError> {
    let path = path.as_ref();
    let write_err = |source: std::io::Error| FileError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    writeln!(file, "{line}").map_err(write_err)
}
