//! Host configuration from environment variables.
//!
//! The library pipeline takes everything by injection; only the binaries
//! read the environment, through `Config::from_env`.

use std::path::{Path, PathBuf};

use crate::adapters::manifest;
use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;
use crate::adapters::JsonArtifactStore;
use crate::application::RangePolicy;
use crate::RiskError;

pub const ARTIFACT_DIR_ENV: &str = "COPD_RISK_ARTIFACT_DIR";
pub const RANGE_POLICY_ENV: &str = "COPD_RISK_RANGE_POLICY";
pub const REQUIRE_SIGNED_ENV: &str = "COPD_RISK_REQUIRE_SIGNED_ARTIFACTS";
pub const PUBKEY_FILE_ENV: &str = "COPD_RISK_ARTIFACT_PUBKEY_B64_FILE";
pub const LOG_MODE_ENV: &str = "COPD_RISK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "COPD_RISK_LOG_FILE";
pub const SANITIZE_MAX_BYTES_ENV: &str = "COPD_RISK_SANITIZE_MAX_BYTES";

const DEFAULT_ARTIFACT_DIR: &str = "artifacts";
const DEFAULT_LOG_FILE: &str = "copd-risk.log";

/// Where the host writes logs. Stdout is reserved for responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Same as `Stderr`
    Auto,
    File,
    Stderr,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub artifact_dir: PathBuf,
    pub range_policy: RangePolicy,
    pub require_signed: bool,
    pub pubkey_file: Option<PathBuf>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    /// Per-line cap for the log sanitizer.
    pub sanitize_max_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            range_policy: RangePolicy::default(),
            require_signed: false,
            pubkey_file: None,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `RiskError::Config` for unparseable values.
    pub fn from_env() -> Result<Self, RiskError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    /// Returns `RiskError::Config` for unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RiskError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ARTIFACT_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            config.artifact_dir = PathBuf::from(dir.trim());
        }
        if let Some(policy) = lookup(RANGE_POLICY_ENV) {
            config.range_policy = policy
                .parse()
                .map_err(|e| RiskError::Config(format!("{RANGE_POLICY_ENV}: {e}")))?;
        }
        if let Some(v) = lookup(REQUIRE_SIGNED_ENV) {
            config.require_signed = parse_bool(&v);
        }
        config.pubkey_file = lookup(PUBKEY_FILE_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(|v| PathBuf::from(v.trim()));
        if let Some(mode) = lookup(LOG_MODE_ENV) {
            config.log_mode = match mode.trim().to_ascii_lowercase().as_str() {
                "auto" => LogMode::Auto,
                "file" => LogMode::File,
                "stderr" => LogMode::Stderr,
                other => {
                    return Err(RiskError::Config(format!(
                        "{LOG_MODE_ENV}: unknown mode {other:?} (expected auto, file or stderr)"
                    )))
                }
            };
        }
        if let Some(file) = lookup(LOG_FILE_ENV).filter(|v| !v.trim().is_empty()) {
            config.log_file = PathBuf::from(file.trim());
        }
        if let Some(v) = lookup(SANITIZE_MAX_BYTES_ENV) {
            config.sanitize_max_bytes = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    RiskError::Config(format!(
                        "{SANITIZE_MAX_BYTES_ENV}: expected a positive byte count, got {v:?}"
                    ))
                })?;
        }

        Ok(config)
    }

    /// Build the artifact store this configuration describes.
    ///
    /// # Errors
    /// Returns `RiskError::Io` if the key file cannot be read, or
    /// `RiskError::ArtifactLoad` if the key is malformed.
    pub fn artifact_store(&self) -> Result<JsonArtifactStore, RiskError> {
        let mut store =
            JsonArtifactStore::new(&self.artifact_dir).require_signed(self.require_signed);
        if let Some(path) = &self.pubkey_file {
            let b64 = std::fs::read_to_string(path)?;
            store = store.with_verifying_key(manifest::verifying_key_from_b64(&b64)?);
        }
        Ok(store)
    }
}

/// Parse a boolean flag: `1`, `true`, `yes` (any case) are true.
#[must_use]
pub fn parse_bool(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// `artifacts/` next to the running executable, else `./artifacts`.
fn default_artifact_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| dir.join(DEFAULT_ARTIFACT_DIR))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR))
}
