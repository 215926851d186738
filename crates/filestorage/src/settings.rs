use std::{env, net::SocketAddr, path::PathBuf};

use thiserror::Error;

use crate::DEFAULT_MAX_UPLOAD_BYTES;

const ADDR_VAR: &str = "FILESTORAGE_ADDR";
const DATA_DIR_VAR: &str = "FILESTORAGE_DATA_DIR";
const MAX_UPLOAD_VAR: &str = "FILESTORAGE_MAX_UPLOAD_BYTES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_address: SocketAddr,
    pub storage_root: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{var} must be a socket address (got `{value}`)")]
    InvalidAddress { var: &'static str, value: String },
    #[error("{var} must be a positive byte count (got `{value}`)")]
    InvalidByteCount { var: &'static str, value: String },
    #[error("{var} cannot be empty")]
    Empty { var: &'static str },
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            storage_root: PathBuf::from("./storage"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds settings from any variable source, falling back to defaults for
    /// unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(value) = lookup(ADDR_VAR) {
            settings.bind_address = value.trim().parse().map_err(|_| {
                SettingsError::InvalidAddress {
                    var: ADDR_VAR,
                    value: value.clone(),
                }
            })?;
        }

        if let Some(value) = lookup(DATA_DIR_VAR) {
            if value.trim().is_empty() {
                return Err(SettingsError::Empty { var: DATA_DIR_VAR });
            }
            settings.storage_root = PathBuf::from(value);
        }

        if let Some(value) = lookup(MAX_UPLOAD_VAR) {
            let parsed = value.trim().parse::<usize>();
            settings.max_upload_bytes = match parsed {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(SettingsError::InvalidByteCount {
                        var: MAX_UPLOAD_VAR,
                        value,
                    });
                }
            };
        }

        Ok(settings)
    }
}
