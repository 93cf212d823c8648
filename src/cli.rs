//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use serde_json::{Map, Value};

use crate::config::schema::PORT_KEY;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "stashbox", version)]
#[command(about = "Mount storage backends under URL paths and serve them over HTTP", long_about = None)]
pub struct GatewayArgs {
    /// Port to listen on (overrides PORT from env and config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Configuration file (JSON, or TOML by extension)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl GatewayArgs {
    /// The override layer: only flags actually given.
    pub fn overrides(&self) -> Map<String, Value> {
        let mut overrides = Map::new();
        if let Some(port) = self.port {
            overrides.insert(PORT_KEY.to_string(), Value::from(port));
        }
        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = GatewayArgs::parse_from(["stashbox", "-p", "9000", "--config", "stash.toml"]);
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.config, Some(PathBuf::from("stash.toml")));
        assert_eq!(args.overrides().get("PORT"), Some(&Value::from(9000)));
    }

    #[test]
    fn test_no_flags_no_overrides() {
        let args = GatewayArgs::parse_from(["stashbox"]);
        assert!(args.overrides().is_empty());
        assert!(args.config.is_none());
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(GatewayArgs::try_parse_from(["stashbox", "--port", "99999"]).is_err());
    }
}
