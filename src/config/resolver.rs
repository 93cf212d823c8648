//! Layered configuration resolution.
//!
//! # Responsibilities
//! - Assemble the four layers in precedence order
//! - Answer key lookups from the first layer that defines the key
//!
//! # Design Decisions
//! - Resolved once at startup, never mutated afterwards
//! - Lookups do not merge across layers: a layer that defines `mounts`
//!   supplies the whole collection

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::layers::ConfigLayer;
use crate::config::loader::{ConfigError, FileSource, CONFIG_ENV_VAR};

/// Immutable, fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Configuration {
    layers: Vec<ConfigLayer>,
    details: String,
    missing_default_file: Option<PathBuf>,
}

impl Configuration {
    /// Resolve configuration from the process environment.
    ///
    /// Precedence, highest first: `overrides`, `STASHBOX__` environment
    /// variables, the configuration file, built-in defaults.
    pub fn resolve(
        overrides: Map<String, Value>,
        config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let vars = std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)));
        Self::resolve_with_env(overrides, config_path, vars)
    }

    /// Resolve configuration against an explicit set of environment variables.
    pub fn resolve_with_env<I>(
        overrides: Map<String, Value>,
        config_path: Option<&Path>,
        vars: I,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let config_env = vars
            .iter()
            .find(|(name, _)| name == CONFIG_ENV_VAR)
            .map(|(_, value)| value.as_str());

        let source = FileSource::locate(config_path, config_env);
        Self::from_source(overrides, &source, vars)
    }

    /// Resolve configuration against an already located file.
    pub fn from_source(
        overrides: Map<String, Value>,
        source: &FileSource,
        vars: Vec<(String, String)>,
    ) -> Result<Self, ConfigError> {
        let (file_layer, missing_default_file) = match source.load()? {
            Some(layer) => (layer, None),
            None => (ConfigLayer::empty("file"), Some(source.path().to_path_buf())),
        };

        let layers = vec![
            ConfigLayer::overrides(overrides),
            ConfigLayer::environment(vars),
            file_layer,
            ConfigLayer::defaults(),
        ];

        Ok(Self {
            layers,
            details: source.to_string(),
            missing_default_file,
        })
    }

    /// Build a configuration from layers already in precedence order.
    pub fn from_layers(layers: Vec<ConfigLayer>, details: impl Into<String>) -> Self {
        Self {
            layers,
            details: details.into(),
            missing_default_file: None,
        }
    }

    /// Value of a colon-delimited key from the highest-precedence layer defining it.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.layers.iter().find_map(|layer| layer.lookup(key))
    }

    /// Name of the layer that supplies `key`, for diagnostics.
    pub fn source_of(&self, key: &str) -> Option<&'static str> {
        self.layers
            .iter()
            .find(|layer| layer.lookup(key).is_some())
            .map(ConfigLayer::name)
    }

    /// Human-readable note on which configuration file was used.
    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    /// The default file that was looked for and not found, if any.
    pub fn missing_default_file(&self) -> Option<&Path> {
        self.missing_default_file.as_deref()
    }

    /// Report how configuration was assembled.
    ///
    /// Resolution runs before the subscriber exists, so this is called
    /// once logging is initialised.
    pub fn log_sources(&self) {
        if let Some(path) = self.missing_default_file() {
            tracing::warn!(
                path = %path.display(),
                "Default configuration file not found, continuing without it"
            );
        }
        for layer in self.layers.iter().filter(|layer| layer.name() == "environment") {
            for key in layer.leaf_keys() {
                tracing::debug!(key = %key, "Setting configuration key from environment");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn port_override(port: u16) -> Map<String, Value> {
        let mut overrides = Map::new();
        overrides.insert("PORT".into(), json!(port));
        overrides
    }

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_override_beats_every_layer() {
        let file = config_file(r#"{ "PORT": 8080 }"#);
        let vars = vec![("STASHBOX__PORT".to_string(), "8081".to_string())];
        let config =
            Configuration::resolve_with_env(port_override(9000), Some(file.path()), vars).unwrap();
        assert_eq!(config.get("PORT"), Some(&json!(9000)));
        assert_eq!(config.source_of("PORT"), Some("overrides"));
    }

    #[test]
    fn test_file_beats_default() {
        let file = config_file(r#"{ "PORT": 8080 }"#);
        let config =
            Configuration::resolve_with_env(Map::new(), Some(file.path()), Vec::new()).unwrap();
        assert_eq!(config.get("PORT"), Some(&json!(8080)));
        assert_eq!(config.get("LOGGING:level"), Some(&json!("info")));
    }

    #[test]
    fn test_environment_beats_file() {
        let file = config_file(r#"{ "PORT": 8080 }"#);
        let vars = vec![("STASHBOX__PORT".to_string(), "7000".to_string())];
        let config = Configuration::resolve_with_env(Map::new(), Some(file.path()), vars).unwrap();
        assert_eq!(config.get("PORT"), Some(&json!("7000")));
        assert_eq!(config.source_of("PORT"), Some("environment"));
    }

    #[test]
    fn test_environment_mounts_replace_file_mounts() {
        let file = config_file(
            r#"{ "mounts": [ { "mount": "/a", "provider": "file", "basePath": "a" },
                             { "mount": "/b", "provider": "file", "basePath": "b" } ] }"#,
        );
        let vars = vec![
            ("STASHBOX__mounts__0__mount".to_string(), "/env".to_string()),
            ("STASHBOX__mounts__0__provider".to_string(), "env".to_string()),
            ("STASHBOX__mounts__0__var".to_string(), "KEY".to_string()),
        ];
        let config = Configuration::resolve_with_env(Map::new(), Some(file.path()), vars).unwrap();
        let mounts = config.get("mounts").unwrap().as_array().unwrap();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0]["mount"], json!("/env"));
    }

    #[test]
    fn test_config_file_from_environment_variable() {
        let file = config_file(r#"{ "PORT": 1234 }"#);
        let vars = vec![(
            CONFIG_ENV_VAR.to_string(),
            file.path().to_string_lossy().into_owned(),
        )];
        let config = Configuration::resolve_with_env(Map::new(), None, vars).unwrap();
        assert_eq!(config.get("PORT"), Some(&json!(1234)));
        assert!(config.details().contains(CONFIG_ENV_VAR));
    }

    #[test]
    fn test_unparsable_explicit_file_fails() {
        let file = config_file("not json");
        let result = Configuration::resolve_with_env(Map::new(), Some(file.path()), Vec::new());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_undefined_key() {
        let config = Configuration::from_layers(vec![ConfigLayer::defaults()], "defaults only");
        assert_eq!(config.get("NOPE"), None);
        assert_eq!(config.source_of("NOPE"), None);
    }

    #[test]
    fn test_missing_default_file_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::Default(dir.path().join("config.json"));
        let config = Configuration::from_source(Map::new(), &source, Vec::new()).unwrap();
        assert_eq!(
            config.missing_default_file(),
            Some(dir.path().join("config.json").as_path())
        );
        assert_eq!(config.get("PORT"), Some(&json!(80)));

        let file = config_file(r#"{ "PORT": 8080 }"#);
        let config =
            Configuration::resolve_with_env(Map::new(), Some(file.path()), Vec::new()).unwrap();
        assert_eq!(config.missing_default_file(), None);
    }

    #[test]
    fn test_sources_are_logged_once_a_subscriber_exists() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::Default(dir.path().join("config.json"));
        let vars = vec![("STASHBOX__PORT".to_string(), "7000".to_string())];
        let config = Configuration::from_source(Map::new(), &source, vars).unwrap();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || config.log_sources());

        let output = logs.contents();
        assert!(output.contains("Default configuration file not found"));
        assert!(output.contains("WARN"));
        assert!(output.contains("key=PORT"));
    }
}
