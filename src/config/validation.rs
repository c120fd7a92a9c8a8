//! Configuration validation.
//!
//! # Responsibilities
//! - Check the site origin is an absolute URL
//! - Check port ranges and the HMR protocol set
//! - Apply defaults for omitted optional fields
//! - Produce the immutable `Configuration`
//!
//! # Design Decisions
//! - Fail fast: the first invalid field is reported, no partial result
//! - Validation is a pure function: &ConfigSource → Result<Configuration, ConfigError>
//! - Checks run in a fixed order (site, integrations, server, HMR) so the
//!   reported field is deterministic

use thiserror::Error;
use url::Url;

use crate::config::resolved::{
    Configuration, DevProxySettings, HmrProtocol, IntegrationSpec, ServerSettings, SiteOrigin,
    DEFAULT_HOST, DEFAULT_PORT,
};
use crate::config::schema::{ConfigSource, HmrSource};

/// A configuration field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ConfigError {
    /// Dotted path of the offending field, e.g. `server.port`.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validate a raw source and resolve it into a `Configuration`.
pub fn validate(source: &ConfigSource) -> Result<Configuration, ConfigError> {
    let site_origin = validate_site(source.site.as_deref())?;
    let integrations = validate_integrations(source)?;
    let server = validate_server(source)?;
    let dev_proxy = validate_dev_proxy(source, server.port)?;

    Ok(Configuration {
        site_origin,
        integrations,
        server,
        dev_proxy,
    })
}

fn validate_site(site: Option<&str>) -> Result<SiteOrigin, ConfigError> {
    let raw = site.ok_or_else(|| ConfigError::new("site", "missing"))?;
    let url = Url::parse(raw).map_err(|_| ConfigError::new("site", "invalid URL"))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::new("site", "invalid URL"));
    }
    Ok(SiteOrigin {
        raw: raw.to_string(),
        url,
    })
}

fn validate_integrations(source: &ConfigSource) -> Result<Vec<IntegrationSpec>, ConfigError> {
    source
        .integrations
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            if entry.name().trim().is_empty() {
                return Err(ConfigError::new(
                    format!("integrations[{index}]"),
                    "empty integration name",
                ));
            }
            Ok(IntegrationSpec {
                name: entry.name().to_string(),
                options: entry.options(),
            })
        })
        .collect()
}

fn validate_server(source: &ConfigSource) -> Result<ServerSettings, ConfigError> {
    let host = match &source.server.host {
        Some(host) if host.trim().is_empty() => {
            return Err(ConfigError::new("server.host", "must be non-empty"));
        }
        Some(host) => host.clone(),
        None => DEFAULT_HOST.to_string(),
    };

    let port = match source.server.port {
        Some(port) => check_port("server.port", port)?,
        None => DEFAULT_PORT,
    };

    Ok(ServerSettings { host, port })
}

fn validate_dev_proxy(
    source: &ConfigSource,
    server_port: u16,
) -> Result<DevProxySettings, ConfigError> {
    let (prefix, hmr) = match (&source.dev_proxy, &source.vite.server.hmr) {
        (Some(_), Some(_)) => {
            return Err(ConfigError::new("devProxy", "conflicts with vite.server.hmr"));
        }
        (Some(hmr), None) => ("devProxy", hmr.clone()),
        (None, Some(hmr)) => ("vite.server.hmr", hmr.clone()),
        (None, None) => ("vite.server.hmr", HmrSource::default()),
    };

    let client_port = match hmr.client_port {
        Some(port) => check_port(&format!("{prefix}.clientPort"), port)?,
        None => server_port,
    };

    let protocol = match hmr.protocol.as_deref() {
        Some(value) => HmrProtocol::parse(value).ok_or_else(|| {
            ConfigError::new(format!("{prefix}.protocol"), "protocol not in {ws,wss}")
        })?,
        None => HmrProtocol::Ws,
    };

    Ok(DevProxySettings {
        client_port,
        protocol,
    })
}

fn check_port(field: &str, port: i64) -> Result<u16, ConfigError> {
    u16::try_from(port).map_err(|_| ConfigError::new(field, "out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{IntegrationEntry, ServerSource};

    fn base() -> ConfigSource {
        ConfigSource {
            site: Some("https://example.com".into()),
            integrations: vec!["tailwind".into()],
            server: ServerSource {
                host: Some("0.0.0.0".into()),
                port: Some(5000),
            },
            dev_proxy: Some(HmrSource {
                client_port: Some(443),
                protocol: Some("wss".into()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_source_resolves() {
        let config = validate(&base()).unwrap();
        assert_eq!(config.site_origin(), "https://example.com");
        assert_eq!(config.integrations()[0].name, "tailwind");
        assert_eq!(config.server().host(), "0.0.0.0");
        assert_eq!(config.server().port(), 5000);
        assert_eq!(config.dev_proxy().client_port(), 443);
        assert_eq!(config.dev_proxy().protocol(), HmrProtocol::Wss);
    }

    #[test]
    fn test_first_invalid_field_wins() {
        let mut source = base();
        source.site = Some("not a url".into());
        source.server.port = Some(-1);
        let err = validate(&source).unwrap_err();
        assert_eq!(err.field, "site");
    }

    #[test]
    fn test_missing_site() {
        let mut source = base();
        source.site = None;
        assert_eq!(validate(&source).unwrap_err(), ConfigError::new("site", "missing"));
    }

    #[test]
    fn test_cannot_be_a_base_rejected() {
        let mut source = base();
        source.site = Some("mailto:someone@example.com".into());
        assert_eq!(validate(&source).unwrap_err().reason, "invalid URL");
    }

    #[test]
    fn test_whitespace_host_rejected() {
        let mut source = base();
        source.server.host = Some("   ".into());
        assert_eq!(validate(&source).unwrap_err().field, "server.host");
    }

    #[test]
    fn test_empty_integration_name() {
        let mut source = base();
        source.integrations.push(IntegrationEntry::Name(String::new()));
        let err = validate(&source).unwrap_err();
        assert_eq!(err.field, "integrations[1]");
    }

    #[test]
    fn test_client_port_defaults_to_server_port() {
        let mut source = base();
        source.dev_proxy = None;
        let config = validate(&source).unwrap();
        assert_eq!(config.dev_proxy().client_port(), 5000);
        assert_eq!(config.dev_proxy().protocol(), HmrProtocol::Ws);
    }

    #[test]
    fn test_hmr_field_names_follow_source_shape() {
        let mut source = base();
        source.dev_proxy = None;
        source.vite.server.hmr = Some(HmrSource {
            client_port: Some(70_000),
            protocol: None,
        });
        let err = validate(&source).unwrap_err();
        assert_eq!(err.field, "vite.server.hmr.clientPort");
    }

    #[test]
    fn test_protocol_is_case_sensitive() {
        let mut source = base();
        source.dev_proxy = Some(HmrSource {
            client_port: Some(443),
            protocol: Some("WSS".into()),
        });
        let err = validate(&source).unwrap_err();
        assert_eq!(err, ConfigError::new("devProxy.protocol", "protocol not in {ws,wss}"));
    }

    #[test]
    fn test_both_hmr_shapes_conflict() {
        let mut source = base();
        source.vite.server.hmr = Some(HmrSource::default());
        assert_eq!(validate(&source).unwrap_err().field, "devProxy");
    }
}
