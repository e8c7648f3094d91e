use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::enrollment::SecretPolicy;
use crate::error::{Error, Result};
use crate::totp::{check_window, DEFAULT_WINDOW};

/// Presentation settings handed to the enrollment front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Issuer shown by authenticator apps next to each account.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default)]
    pub policy: SecretPolicy,
    /// Windows accepted on either side of the current one when verifying.
    #[serde(default = "default_verify_window")]
    pub verify_window: u64,
}

fn default_issuer() -> String {
    "AuthFam".into()
}

const fn default_verify_window() -> u64 {
    DEFAULT_WINDOW
}

impl Default for Config {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            policy: SecretPolicy::default(),
            verify_window: default_verify_window(),
        }
    }
}

impl Config {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        check_window(config.verify_window)?;
        Ok(config)
    }

    /// Load `path` when given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
