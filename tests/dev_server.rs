//! End-to-end tests against a running dev server.

use std::fs;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_tungstenite::connect_async;

use devhost::config::{load_str, Format};
use devhost::hmr::HmrEvent;
use devhost::integration::IntegrationRegistry;
use devhost::lifecycle::{start, RunningServer, ServeOptions, Shutdown, StartupError};

mod common;

const CONFIG: &str = r#"
    site = "https://example.com"
    integrations = [
        "tailwind",
        { name = "headers", options = { "X-Dev-Server" = "devhost" } },
    ]

    [server]
    host = "127.0.0.1"
    port = 0

    [devProxy]
    clientPort = 443
    protocol = "wss"
"#;

async fn start_server(options: ServeOptions, shutdown: Shutdown) -> RunningServer {
    let config = load_str(CONFIG, Format::Toml).unwrap();
    start(config, options, &IntegrationRegistry::with_builtins(), shutdown)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_integrations_applied_in_order() {
    let shutdown = Shutdown::new();
    let server = start_server(ServeOptions::default(), shutdown.clone()).await;

    assert_eq!(
        server.build_context().applied(),
        &["tailwind".to_string(), "headers".to_string()]
    );

    shutdown.trigger();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_hmr_info_endpoint() {
    let shutdown = Shutdown::new();
    let server = start_server(ServeOptions::default(), shutdown.clone()).await;
    let addr = server.local_addr();

    let info: serde_json::Value = reqwest::get(format!("http://{addr}/__devhost/hmr"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(info["protocol"], "wss");
    assert_eq!(info["host"], "127.0.0.1");
    assert_eq!(info["clientPort"], 443);
    assert_eq!(info["url"], "wss://127.0.0.1:443/__hmr");

    shutdown.trigger();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_serves_root_with_integration_headers() {
    let root = common::scratch_dir("root");
    fs::write(root.join("index.html"), "<h1>hello</h1>").unwrap();

    let shutdown = Shutdown::new();
    let options = ServeOptions {
        root: Some(root),
        ..Default::default()
    };
    let server = start_server(options, shutdown.clone()).await;
    let addr = server.local_addr();

    let response = reqwest::get(format!("http://{addr}/index.html")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-dev-server"], "devhost");
    assert_eq!(response.headers()["cache-control"], "no-store");
    assert_eq!(response.text().await.unwrap(), "<h1>hello</h1>");

    let missing = reqwest::get(format!("http://{addr}/nope.html")).await.unwrap();
    assert_eq!(missing.status(), 404);

    shutdown.trigger();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_hmr_socket_receives_events() {
    let shutdown = Shutdown::new();
    let server = start_server(ServeOptions::default(), shutdown.clone()).await;
    let addr = server.local_addr();

    let (mut socket, _) = connect_async(format!("ws://{addr}/__hmr")).await.unwrap();

    let first = socket.next().await.unwrap().unwrap();
    let event: HmrEvent = serde_json::from_str(first.to_text().unwrap()).unwrap();
    assert_eq!(event, HmrEvent::Connected);

    let reload = HmrEvent::FullReload {
        path: Some("index.html".into()),
    };
    assert_eq!(server.hub().publish(reload.clone()), 1);

    let next = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let event: HmrEvent = serde_json::from_str(next.to_text().unwrap()).unwrap();
    assert_eq!(event, reload);

    shutdown.trigger();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_watcher_publishes_reload() {
    let root = common::scratch_dir("watch");
    let shutdown = Shutdown::new();
    let options = ServeOptions {
        root: Some(root.clone()),
        watch: true,
        ..Default::default()
    };
    let server = start_server(options, shutdown.clone()).await;
    let mut events = server.hub().subscribe();

    fs::write(root.join("page.html"), "changed").unwrap();

    let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, HmrEvent::FullReload { .. }));

    shutdown.trigger();
    server.wait().await.unwrap();
}

async fn next_config_change(events: &mut broadcast::Receiver<HmrEvent>) -> HmrEvent {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let event = events.recv().await.unwrap();
            if matches!(event, HmrEvent::ConfigChanged { .. }) {
                return event;
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_config_change_survives_rename_save() {
    let dir = common::scratch_dir("config");
    let config_path = dir.join("devhost.toml");
    fs::write(&config_path, CONFIG).unwrap();

    let shutdown = Shutdown::new();
    let options = ServeOptions {
        config_path: Some(config_path.clone()),
        watch: true,
        ..Default::default()
    };
    let server = start_server(options, shutdown.clone()).await;
    let mut events = server.hub().subscribe();

    // Save the way many editors do: write a sibling, rename it over the file.
    let staged = dir.join("devhost.toml.tmp");
    fs::write(&staged, CONFIG).unwrap();
    fs::rename(&staged, &config_path).unwrap();
    let event = next_config_change(&mut events).await;
    assert!(matches!(event, HmrEvent::ConfigChanged { ref path } if path.ends_with("devhost.toml")));

    tokio::time::sleep(Duration::from_millis(500)).await;
    while events.try_recv().is_ok() {}

    // The watch is still in place after the rename.
    fs::write(&config_path, CONFIG).unwrap();
    next_config_change(&mut events).await;

    shutdown.trigger();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_missing_root_fails_startup() {
    let root = common::scratch_dir("absent").join("does-not-exist");
    let config = load_str(CONFIG, Format::Toml).unwrap();
    let options = ServeOptions {
        root: Some(root),
        ..Default::default()
    };
    let result = start(config, options, &IntegrationRegistry::with_builtins(), Shutdown::new()).await;
    assert!(matches!(result, Err(StartupError::InvalidRoot(_))));
}

#[tokio::test]
async fn test_bad_integration_options_fail_startup() {
    let config = load_str(
        r#"
        site = "https://example.com"
        integrations = [{ name = "headers", options = ["not", "a", "table"] }]

        [server]
        host = "127.0.0.1"
        port = 0
        "#,
        Format::Toml,
    )
    .unwrap();
    let result = start(
        config,
        ServeOptions::default(),
        &IntegrationRegistry::with_builtins(),
        Shutdown::new(),
    )
    .await;
    assert!(matches!(result, Err(StartupError::Integration(_))));
}
