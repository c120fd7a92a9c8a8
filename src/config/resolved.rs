//! Validated, immutable configuration.
//!
//! A `Configuration` can only be built by `validation::validate`, so holding
//! one is proof that every field passed its checks. Fields are private and
//! exposed through accessors; the value is `Clone + Send + Sync` and is shared
//! read-only through `Arc` by the host process.

use std::fmt;

use serde::Serialize;
use url::Url;

/// Default `server.host` when omitted.
pub const DEFAULT_HOST: &str = "localhost";

/// Default `server.port` when omitted.
pub const DEFAULT_PORT: u16 = 4321;

/// Fully resolved site configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub(crate) site_origin: SiteOrigin,
    pub(crate) integrations: Vec<IntegrationSpec>,
    pub(crate) server: ServerSettings,
    pub(crate) dev_proxy: DevProxySettings,
}

impl Configuration {
    /// Site origin exactly as written in the source.
    pub fn site_origin(&self) -> &str {
        &self.site_origin.raw
    }

    /// Parsed site origin.
    pub fn site_url(&self) -> &Url {
        &self.site_origin.url
    }

    /// Integration entries in declaration order.
    pub fn integrations(&self) -> &[IntegrationSpec] {
        &self.integrations
    }

    pub fn server(&self) -> &ServerSettings {
        &self.server
    }

    pub fn dev_proxy(&self) -> &DevProxySettings {
        &self.dev_proxy
    }
}

/// The site origin, kept verbatim alongside its parsed form.
///
/// `Url` normalises its input (e.g. appends a trailing `/`), so the raw string
/// is what round-trips.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SiteOrigin {
    pub(crate) raw: String,
    pub(crate) url: Url,
}

impl Serialize for SiteOrigin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// One declared integration: an identifier and its opaque options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrationSpec {
    pub name: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub options: serde_json::Value,
}

/// Where the dev server listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSettings {
    pub(crate) host: String,
    pub(crate) port: u16,
}

impl ServerSettings {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// How clients reach the HMR channel through a reverse proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevProxySettings {
    pub(crate) client_port: u16,
    pub(crate) protocol: HmrProtocol,
}

impl DevProxySettings {
    pub fn client_port(&self) -> u16 {
        self.client_port
    }

    pub fn protocol(&self) -> HmrProtocol {
        self.protocol
    }
}

/// WebSocket scheme advertised to HMR clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HmrProtocol {
    Ws,
    Wss,
}

impl HmrProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            HmrProtocol::Ws => "ws",
            HmrProtocol::Wss => "wss",
        }
    }

    /// Parse the exact lowercase scheme; anything else is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ws" => Some(HmrProtocol::Ws),
            "wss" => Some(HmrProtocol::Wss),
            _ => None,
        }
    }
}

impl fmt::Display for HmrProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
