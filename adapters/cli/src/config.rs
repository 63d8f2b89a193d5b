use std::{
    fs, io,
    path::{Path, PathBuf},
};

use spellgrid_system_turns::ArenaConfig;
use thiserror::Error;

/// Errors raised while loading an arena configuration file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not a valid arena configuration.
    #[error("failed to parse {}", path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying TOML failure.
        #[source]
        source: toml::de::Error,
    },
}

/// Loads the configuration file, or the defaults when none is given.
pub(crate) fn load(path: Option<&Path>) -> Result<ArenaConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(ArenaConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, path)
}

fn parse(text: &str, path: &Path) -> Result<ArenaConfig, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
