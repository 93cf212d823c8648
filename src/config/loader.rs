//! Configuration file discovery and loading from disk.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::layers::ConfigLayer;
use crate::config::validation::ValidationError;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "STASHBOX_CONFIG";

/// File used when neither the command line nor the environment names one.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Errors raised while resolving configuration or building mounts.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly named configuration file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The configuration file could not be read.
    #[error("failed to read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON/TOML or not an object.
    #[error("failed to parse configuration file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A resolved key holds a value of the wrong shape.
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// One or more mount entries are malformed.
    #[error("invalid mounts: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// A mount's provider is not one this gateway knows.
    #[error("mount '{mount}': unknown provider '{provider}'")]
    UnknownProvider { mount: String, provider: String },

    /// A provider parameter required at construction is absent.
    #[error("mount '{mount}': provider '{provider}' requires parameter '{param}'")]
    MissingParameter {
        mount: String,
        provider: String,
        param: &'static str,
    },

    /// A provider parameter is present but unusable.
    #[error("mount '{mount}': invalid parameter '{param}': {message}")]
    InvalidParameter {
        mount: String,
        param: &'static str,
        message: String,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where the configuration file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Named with `--config`.
    CommandLine(PathBuf),
    /// Named by `STASHBOX_CONFIG`.
    Environment(PathBuf),
    /// Fallback `config.json` in the working directory.
    Default(PathBuf),
}

impl FileSource {
    /// Pick the file: explicit path, else the environment variable, else the default.
    pub fn locate(explicit: Option<&Path>, env_value: Option<&str>) -> Self {
        if let Some(path) = explicit {
            return FileSource::CommandLine(path.to_path_buf());
        }
        match env_value {
            Some(value) if !value.trim().is_empty() => FileSource::Environment(PathBuf::from(value)),
            _ => FileSource::Default(PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FileSource::CommandLine(path)
            | FileSource::Environment(path)
            | FileSource::Default(path) => path,
        }
    }

    /// True when the operator named the file rather than relying on the default.
    pub fn is_explicit(&self) -> bool {
        !matches!(self, FileSource::Default(_))
    }

    /// Read the file into a layer.
    ///
    /// A missing default file yields `None`; a missing explicit file or
    /// any unparsable file is an error.
    pub fn load(&self) -> Result<Option<ConfigLayer>, ConfigError> {
        let path = self.path();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if self.is_explicit() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let tree = parse_config(path, &content)?;
        Ok(Some(ConfigLayer::new("file", tree)))
    }
}

impl fmt::Display for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::CommandLine(path) => write!(
                f,
                "Using configuration file specified on command line: {}",
                path.display()
            ),
            FileSource::Environment(path) => write!(
                f,
                "Using configuration file specified in {}: {}",
                CONFIG_ENV_VAR,
                path.display()
            ),
            FileSource::Default(path) => {
                write!(f, "Using default configuration file: {}", path.display())
            }
        }
    }
}

/// Parse file content as TOML (`.toml` extension) or JSON (anything else).
///
/// The document root must be an object.
pub fn parse_config(path: &Path, content: &str) -> Result<Value, ConfigError> {
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let tree: Value = if is_toml {
        toml::from_str(content).map_err(|e| parse_error(e.to_string()))?
    } else {
        serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?
    };

    if !tree.is_object() {
        return Err(parse_error("document root must be an object".to_string()));
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_locate_precedence() {
        let explicit = FileSource::locate(Some(Path::new("a.json")), Some("b.json"));
        assert_eq!(explicit, FileSource::CommandLine("a.json".into()));

        let from_env = FileSource::locate(None, Some("b.json"));
        assert_eq!(from_env, FileSource::Environment("b.json".into()));

        let fallback = FileSource::locate(None, None);
        assert_eq!(fallback, FileSource::Default(DEFAULT_CONFIG_FILE.into()));
        assert!(!fallback.is_explicit());
    }

    #[test]
    fn test_missing_default_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::Default(dir.path().join("config.json"));
        assert_eq!(source.load().unwrap(), None);
    }

    #[test]
    fn test_missing_explicit_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::CommandLine(dir.path().join("nope.json"));
        assert!(matches!(source.load(), Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_unparsable_file_is_fatal() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ \"PORT\": ").unwrap();
        let source = FileSource::Environment(file.path().to_path_buf());
        assert!(matches!(source.load(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "PORT = 8080").unwrap();
        writeln!(file, "[[mounts]]").unwrap();
        writeln!(file, "mount = \"/docs\"").unwrap();
        writeln!(file, "provider = \"file\"").unwrap();
        let layer = FileSource::CommandLine(file.path().to_path_buf())
            .load()
            .unwrap()
            .unwrap();
        assert_eq!(layer.lookup("PORT"), Some(&serde_json::json!(8080)));
        assert_eq!(layer.lookup("mounts:0:mount"), Some(&serde_json::json!("/docs")));
    }

    #[test]
    fn test_root_must_be_object() {
        let err = parse_config(Path::new("config.json"), "[1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
