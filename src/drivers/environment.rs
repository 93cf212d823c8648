//! Provider `env`: exposes one environment variable as a file.
//!
//! ```json
//! { "mount": "/secret/key.pem", "provider": "env", "var": "KEY", "encoding": "base64" }
//! ```
//!
//! Only the mount root is addressable. The variable is read on every
//! request, so changes made to the process environment are visible.

use async_trait::async_trait;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use bytes::Bytes;

use super::{DriverError, ReadOutcome, StorageDriver};
use crate::config::ConfigError;
use crate::routing::descriptor::MountDescriptor;

/// Accepts padded and unpadded input.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// How the variable's value is turned into content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// The value's bytes as-is.
    #[default]
    Plain,
    /// The value is base64 and is decoded before serving.
    Base64,
}

#[derive(Debug, Clone)]
pub struct EnvironmentDriver {
    var: String,
    encoding: Encoding,
}

impl EnvironmentDriver {
    pub const PROVIDER: &'static str = "env";

    pub fn new(var: impl Into<String>, encoding: Encoding) -> Self {
        Self {
            var: var.into(),
            encoding,
        }
    }

    /// Requires `var`; `encoding` must be absent or `base64`.
    pub fn from_descriptor(descriptor: &MountDescriptor) -> Result<Self, ConfigError> {
        let var = descriptor.required_str("var")?;
        let encoding = match descriptor.optional_str("encoding")? {
            None => Encoding::Plain,
            Some("base64") => Encoding::Base64,
            Some(other) => {
                return Err(descriptor.invalid(
                    "encoding",
                    format!("unsupported encoding '{other}', only 'base64' is known"),
                ))
            }
        };
        tracing::info!(mount = %descriptor.mount_path, var, ?encoding, "Using environment variable");
        Ok(Self::new(var, encoding))
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    fn decode(&self, raw: Vec<u8>) -> Result<Bytes, DriverError> {
        match self.encoding {
            Encoding::Plain => Ok(Bytes::from(raw)),
            Encoding::Base64 => {
                let compact: Vec<u8> = raw
                    .into_iter()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                LENIENT_BASE64
                    .decode(compact)
                    .map(Bytes::from)
                    .map_err(|e| DriverError::Decode(format!("{}: {e}", self.var)))
            }
        }
    }
}

#[async_trait]
impl StorageDriver for EnvironmentDriver {
    fn provider(&self) -> &str {
        Self::PROVIDER
    }

    async fn read(&self, path: &str) -> Result<ReadOutcome, DriverError> {
        if !path.is_empty() && path != "/" {
            tracing::debug!(var = %self.var, path, "Env mount only serves its root");
            return Ok(ReadOutcome::NotFound);
        }

        let raw = match std::env::var_os(&self.var) {
            Some(value) if !value.is_empty() => value.into_encoded_bytes(),
            _ => return Ok(ReadOutcome::NotFound),
        };

        Ok(ReadOutcome::Content(self.decode(raw)?))
    }
}
