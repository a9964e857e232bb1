//! Unified path management for embedchat files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/embedchat/         # Config directory
//! └── config.toml              # Settings (endpoint, client id, timeout)
//!
//! ~/.local/share/embedchat/    # Data directory
//! └── identity.json            # Durable visitor identities, one per origin
//! ```

use std::path::PathBuf;

const APP_NAME: &str = "embedchat";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Platform paths for embedchat (XDG on Linux, the native locations elsewhere).
pub struct EmbedchatPaths;

impl EmbedchatPaths {
    /// Returns the embedchat configuration directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the embedchat data directory.
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the settings file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the durable identity store.
    pub fn identity_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("identity.json"))
    }
}
