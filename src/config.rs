//! `golo.toml` loading.
//!
//! ```toml
//! [limits]
//! max_nesting_depth = 128
//!
//! [dump]
//! prefix = "% "
//! show_spans = true
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::dump::DumpOptions;
use crate::limits::{LimitError, LimitsTable, ParseLimits};

pub const DEFAULT_CONFIG_FILE: &str = "golo.toml";

/// Settings for the CLI and the batch runner
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub limits: ParseLimits,
    pub dump: DumpOptions,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed config '{}': {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Limit(#[from] LimitError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    limits: LimitsTable,
    dump: DumpOptions,
}

impl Config {
    /// Load `path`; a missing file yields the defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config = Self::from_toml(&text).map_err(|err| match err {
            ConfigError::Malformed { source, .. } => ConfigError::Malformed {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse config text and validate the resulting limits
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::Malformed {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            source,
        })?;

        let mut limits = ParseLimits::default();
        file.limits.apply(&mut limits);
        limits.validate()?;

        Ok(Self {
            limits,
            dump: file.dump,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = Config::from_toml(
            "[limits]\nmax_nesting_depth = 64\n\n[dump]\nprefix = \"% \"\nshow_spans = true\n",
        )
        .unwrap();

        assert_eq!(config.limits.max_nesting_depth, 64);
        assert_eq!(config.limits.max_ast_nodes, 1_000_000);
        assert_eq!(config.dump.prefix, "% ");
        assert_eq!(config.dump.indent, 2);
        assert!(config.dump.show_spans);
    }

    #[test]
    fn test_invalid_limit_is_rejected() {
        let err = Config::from_toml("[limits]\nmax_ast_nodes = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Limit(LimitError { name: "max_ast_nodes", .. })));
    }

    #[test]
    fn test_unknown_section_is_malformed() {
        let err = Config::from_toml("[parser]\nstrict = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = Path::new("definitely/not/here/golo.toml");
        assert_eq!(Config::from_file(path).unwrap(), Config::default());
    }

    #[test]
    fn test_malformed_file_names_path() {
        let path = std::env::temp_dir().join(format!("golo-config-{}.toml", std::process::id()));
        fs::write(&path, "[limits\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        let _ = fs::remove_file(&path);

        assert!(matches!(err, ConfigError::Malformed { .. }));
        assert!(err.to_string().contains("golo-config-"));
    }
}
