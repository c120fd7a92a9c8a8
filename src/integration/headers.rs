//! Built-in integration that adds fixed response headers.
//!
//! ```toml
//! integrations = [
//!     { name = "headers", options = { "X-Frame-Options" = "DENY" } },
//! ]
//! ```

use axum::http::{HeaderName, HeaderValue};

use crate::integration::{BuildContext, Integration, IntegrationError};

pub const NAME: &str = "headers";

/// Adds each configured header to every dev server response.
#[derive(Debug, Clone, Default)]
pub struct HeadersIntegration {
    headers: Vec<(String, String)>,
}

impl HeadersIntegration {
    /// Build from an options table of `header-name = "value"` pairs.
    ///
    /// Missing options (`null`) mean no headers. Names and values are checked
    /// here so a bad entry fails at startup rather than per request.
    pub fn from_options(options: &serde_json::Value) -> Result<Self, IntegrationError> {
        let table = match options {
            serde_json::Value::Null => return Ok(Self::default()),
            serde_json::Value::Object(table) => table,
            other => {
                return Err(invalid(format!("expected a table, got {other}")));
            }
        };

        let mut headers = Vec::with_capacity(table.len());
        for (name, value) in table {
            let value = value
                .as_str()
                .ok_or_else(|| invalid(format!("value of '{name}' must be a string")))?;
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| invalid(format!("'{name}' is not a valid header name")))?;
            HeaderValue::from_str(value)
                .map_err(|_| invalid(format!("value of '{name}' is not a valid header value")))?;
            headers.push((name.clone(), value.to_string()));
        }

        Ok(Self { headers })
    }
}

fn invalid(reason: String) -> IntegrationError {
    IntegrationError::InvalidOptions {
        name: NAME.to_string(),
        reason,
    }
}

impl Integration for HeadersIntegration {
    fn name(&self) -> &str {
        NAME
    }

    fn apply(&self, ctx: &mut BuildContext) -> Result<(), IntegrationError> {
        for (name, value) in &self.headers {
            ctx.add_response_header(name.clone(), value.clone());
        }
        Ok(())
    }
}
