//! Export of accounts that still have votes to cast.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use retrovote_types::Address;
use retrovote_utils::append_line;

use crate::WorkflowError;

/// Sink for accounts found eligible by the record workflow.
pub trait EligibilityRecorder: Send + Sync {
    fn record(&self, address: &Address, secret_hex: &str) -> Result<(), WorkflowError>;
}

/// Appends one private key per line to a file, the same format the account
/// loader reads, so the export can be fed straight back in.
#[derive(Debug)]
pub struct FileRecorder {
    path: PathBuf,
    // Serializes appends from concurrent workers so lines never interleave.
    write_lock: Mutex<()>,
}

impl FileRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EligibilityRecorder for FileRecorder {
    fn record(&self, address: &Address, secret_hex: &str) -> Result<(), WorkflowError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        append_line(&self.path, secret_hex).map_err(|e| WorkflowError::Recorder(e.to_string()))?;
        tracing::debug!("{address} | recorded to {}", self.path.display());
        Ok(())
    }
}

/// Keeps recorded addresses in memory.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    recorded: Mutex<Vec<Address>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Address> {
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl EligibilityRecorder for MemoryRecorder {
    fn record(&self, address: &Address, _secret_hex: &str) -> Result<(), WorkflowError> {
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(*address);
        Ok(())
    }
}
