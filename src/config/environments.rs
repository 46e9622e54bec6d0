//! Per-environment path configuration
//!
//! Each deployment environment owns exactly one private identity file
//! (outside version control) and one encrypted secrets file (safe to
//! commit). Paths resolve from environment variables with XDG-style
//! defaults.
//!
//! ## Path Resolution Order
//!
//! 1. `TALLY_KEY_DIR` / `TALLY_SECRETS_DIR` environment variables (if set)
//! 2. Keys: `$XDG_CONFIG_HOME/tally/keys` or `~/.config/tally/keys`
//! 3. Secrets: `config/secrets` relative to the working directory

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::TallyError;

/// A deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Local development
    Development,
    /// Automated test runs
    Test,
    /// Production deployment
    Production,
}

impl Environment {
    /// All configured environments, in display order
    pub fn all() -> [Environment; 3] {
        [Self::Development, Self::Test, Self::Production]
    }

    /// Short name used in file names and CLI arguments
    pub fn name(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Environment {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(TallyError::Config(format!(
                "Unknown environment '{}' (expected development, test, or production)",
                other
            ))),
        }
    }
}

/// Resolves the identity-file and encrypted-secrets-file locations
#[derive(Debug, Clone)]
pub struct SecretsPaths {
    key_dir: PathBuf,
    secrets_dir: PathBuf,
}

impl SecretsPaths {
    /// Create a new SecretsPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined and no
    /// override variable is set.
    pub fn new() -> Result<Self, TallyError> {
        let key_dir = if let Ok(custom) = std::env::var("TALLY_KEY_DIR") {
            PathBuf::from(custom)
        } else {
            default_key_dir()?
        };

        let secrets_dir = if let Ok(custom) = std::env::var("TALLY_SECRETS_DIR") {
            PathBuf::from(custom)
        } else {
            PathBuf::from("config").join("secrets")
        };

        Ok(Self {
            key_dir,
            secrets_dir,
        })
    }

    /// Create SecretsPaths with explicit directories (useful for testing)
    pub fn with_dirs(key_dir: PathBuf, secrets_dir: PathBuf) -> Self {
        Self {
            key_dir,
            secrets_dir,
        }
    }

    /// Directory holding private identity files
    pub fn key_dir(&self) -> &PathBuf {
        &self.key_dir
    }

    /// Directory holding encrypted secrets files
    pub fn secrets_dir(&self) -> &PathBuf {
        &self.secrets_dir
    }

    /// Path to an environment's private identity file
    pub fn identity_file(&self, environment: Environment) -> PathBuf {
        self.key_dir.join(format!("{}.key", environment.name()))
    }

    /// Path to an environment's encrypted secrets file
    pub fn secrets_file(&self, environment: Environment) -> PathBuf {
        self.secrets_dir
            .join(format!("{}.enc.json", environment.name()))
    }
}

/// Default key directory: `$XDG_CONFIG_HOME/tally/keys` or `~/.config/tally/keys`
fn default_key_dir() -> Result<PathBuf, TallyError> {
    let config_base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            std::env::var("HOME").map(|home| PathBuf::from(home).join(".config"))
        })
        .map_err(|_| {
            TallyError::Config("Could not determine home directory for key storage".into())
        })?;
    Ok(config_base.join("tally").join("keys"))
}
