//! Shared fixtures for integration tests.

use std::fs;
use std::path::PathBuf;

use devhost::config::{ConfigSource, IntegrationEntry};
use devhost::config::schema::{HmrSource, ServerSource};

/// The reference configuration: the shape every property test starts from.
#[allow(dead_code)]
pub fn reference_source() -> ConfigSource {
    ConfigSource {
        site: Some("https://example.com".into()),
        integrations: vec![IntegrationEntry::from("tailwind")],
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

/// A fresh, empty scratch directory under the system temp dir.
pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("devhost-{label}-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write `content` to `name` inside a fresh scratch directory.
#[allow(dead_code)]
pub fn write_file(label: &str, name: &str, content: &str) -> PathBuf {
    let path = scratch_dir(label).join(name);
    fs::write(&path, content).unwrap();
    path
}
