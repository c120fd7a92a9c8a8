//! Configuration schema definitions.
//!
//! This module defines the raw, unvalidated shape of a site configuration as
//! it appears in a config file. Values are permissive: any integral port
//! (saturated into `i64`) and any protocol string is accepted here, so that
//! out-of-range or unknown values reach `validation.rs` and fail with a
//! field-level `ConfigError` instead of an opaque parse error.
//!
//! Keys are strict: an unknown key in the root, `[server]` or HMR tables is a
//! parse error. `vite` and `vite.server` carry bundler options this crate does
//! not read, so unknown keys there are ignored.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Root of a site configuration file.
///
/// ```toml
/// site = "https://example.com"
/// integrations = ["tailwind"]
///
/// [server]
/// host = "0.0.0.0"
/// port = 5000
///
/// [vite.server.hmr]
/// clientPort = 443
/// protocol = "wss"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigSource {
    /// Site origin URL.
    pub site: Option<String>,

    /// Ordered integration entries.
    pub integrations: Vec<IntegrationEntry>,

    /// Dev server bind settings.
    pub server: ServerSource,

    /// Bundler settings; only `vite.server.hmr` is read.
    pub vite: ViteSource,

    /// Shorthand for `vite.server.hmr`.
    pub dev_proxy: Option<HmrSource>,
}

/// One entry of the `integrations` list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IntegrationEntry {
    /// Bare identifier, e.g. `"tailwind"`.
    Name(String),

    /// Identifier with opaque options.
    Detailed {
        name: String,
        #[serde(default)]
        options: serde_json::Value,
    },
}

impl IntegrationEntry {
    pub fn name(&self) -> &str {
        match self {
            IntegrationEntry::Name(name) => name,
            IntegrationEntry::Detailed { name, .. } => name,
        }
    }

    pub fn options(&self) -> serde_json::Value {
        match self {
            IntegrationEntry::Name(_) => serde_json::Value::Null,
            IntegrationEntry::Detailed { options, .. } => options.clone(),
        }
    }
}

impl From<&str> for IntegrationEntry {
    fn from(name: &str) -> Self {
        IntegrationEntry::Name(name.to_string())
    }
}

/// `[server]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSource {
    /// Bind host (IP literal or hostname).
    pub host: Option<String>,

    /// Bind port.
    #[serde(deserialize_with = "deserialize_port")]
    pub port: Option<i64>,
}

/// `[vite]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViteSource {
    pub server: ViteServerSource,
}

/// `[vite.server]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViteServerSource {
    pub hmr: Option<HmrSource>,
}

/// HMR proxy hint: how clients reach the hot-reload channel.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct HmrSource {
    /// Port clients connect to (usually the reverse proxy's port).
    #[serde(deserialize_with = "deserialize_port")]
    pub client_port: Option<i64>,

    /// `ws` or `wss`.
    pub protocol: Option<String>,
}

/// Read any integral number as a port, saturating into `i64`.
///
/// JSON integers have no width limit; without saturation a port beyond
/// `i64::MAX` would fail in serde rather than as `out of range`.
fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(PortVisitor)
}

struct PortVisitor;

impl<'de> Visitor<'de> for PortVisitor {
    type Value = Option<i64>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer port")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Some(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Some(i64::try_from(value).unwrap_or(i64::MAX)))
    }

    fn visit_i128<E: de::Error>(self, value: i128) -> Result<Self::Value, E> {
        Ok(Some(value.clamp(i64::MIN.into(), i64::MAX.into()) as i64))
    }

    fn visit_u128<E: de::Error>(self, value: u128) -> Result<Self::Value, E> {
        Ok(Some(i64::try_from(value).unwrap_or(i64::MAX)))
    }

    // serde_json hands integers wider than u64 over as floats.
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(E::invalid_type(de::Unexpected::Float(value), &self));
        }
        // `as` saturates float-to-int casts.
        Ok(Some(value as i64))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }
}

/// Values supplied on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ServerOverrides {
    pub host: Option<String>,
    pub port: Option<i64>,
}

impl ConfigSource {
    /// Replace `server.host` / `server.port` with any overrides given.
    ///
    /// Overrides land in the raw source, so they go through the same
    /// validation as values read from the file.
    pub fn apply_overrides(mut self, overrides: &ServerOverrides) -> Self {
        if let Some(host) = &overrides.host {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.port {
            self.server.port = Some(port);
        }
        self
    }
}
