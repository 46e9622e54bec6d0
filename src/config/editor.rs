//! Interactive editor selection and invocation
//!
//! The lifecycle CLI edits plaintext secrets in the operator's editor of
//! choice. Selection order: `VISUAL`, then `EDITOR`, then `vi`.

use std::path::Path;
use std::process::Command;

use crate::error::{TallyError, TallyResult};

/// Hard default when neither editor variable is set
const DEFAULT_EDITOR: &str = "vi";

/// Editor-selection policy
#[derive(Debug, Clone)]
pub struct EditorPolicy {
    command: String,
}

impl EditorPolicy {
    /// Resolve the editor from the process environment
    pub fn from_env() -> Self {
        let command = std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        Self { command }
    }

    /// Use a fixed editor command (useful for testing)
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// The resolved editor command
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Open a file in the editor and block until it exits
    ///
    /// A non-zero exit status is a hard failure: callers must abort
    /// before any encryption step.
    pub fn edit(&self, path: &Path) -> TallyResult<()> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            TallyError::Config("Editor command is empty".to_string())
        })?;

        let status = Command::new(program)
            .args(parts)
            .arg(path)
            .status()
            .map_err(|e| TallyError::Io(format!("Failed to launch editor '{}': {}", program, e)))?;

        if !status.success() {
            return Err(TallyError::Editor {
                editor: self.command.clone(),
                status: status.code().unwrap_or(-1),
            });
        }

        Ok(())
    }
}
