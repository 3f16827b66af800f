//! Configuration loading for mail services
//!
//! Supports loading API credentials from (in order of priority):
//! 1. JSON file (~/.config/vela/graph-credentials.json)
//! 2. Runtime environment variables (fallback)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Credentials filename in the Vela config directory
const CREDENTIALS_FILE: &str = "graph-credentials.json";

/// Environment variable carrying a bearer token
const TOKEN_ENV: &str = "VELA_GRAPH_TOKEN";

/// Credentials for the hosted mail API
#[derive(Debug, Clone)]
pub struct GraphCredentials {
    pub access_token: String,
}

/// Credential file format
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialFile {
    access_token: String,
}

impl GraphCredentials {
    /// Load credentials using the following priority:
    /// 1. JSON file (~/.config/vela/graph-credentials.json)
    /// 2. Runtime environment variables
    pub fn load() -> Result<Self> {
        if config::config_exists(CREDENTIALS_FILE) {
            let file: CredentialFile = config::load_json(CREDENTIALS_FILE)?;
            return Self::from_credential_file(file);
        }

        Self::from_env()
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: CredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(file)
    }

    /// Load credentials from the environment
    pub fn from_env() -> Result<Self> {
        let access_token = std::env::var(TOKEN_ENV)
            .with_context(|| format!("No credentials file and {} is not set", TOKEN_ENV))?;
        if access_token.is_empty() {
            anyhow::bail!("{} is set but empty", TOKEN_ENV);
        }
        Ok(Self { access_token })
    }

    fn from_credential_file(file: CredentialFile) -> Result<Self> {
        if file.access_token.is_empty() {
            anyhow::bail!("Credentials file has an empty accessToken");
        }
        Ok(Self {
            access_token: file.access_token,
        })
    }
}
