// End-to-end tests: a real listener, the real route table, raw HTTP/1.1

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::task::LocalSet;

use mirror_lab::config::{AppState, Config, EnvOverrides};
use mirror_lab::handler::build_router;
use mirror_lab::probe::{self, ProbeClient};
use mirror_lab::server::{self, ServerOptions};

fn test_config() -> Config {
    let mut config =
        Config::load_with("does-not-exist/mirror-lab", &EnvOverrides::default()).unwrap();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.logging.access_log = false;
    config.site.forms_post_file = concat!(env!("CARGO_MANIFEST_DIR"), "/static/forms-post.html")
        .to_string();
    config.site.environment = "test".to_string();
    config
}

/// Bind an ephemeral port and start serving on the current `LocalSet`
fn spawn_server(config: &Config) -> (SocketAddr, Arc<Notify>) {
    let listener = server::create_reusable_listener(config.get_socket_addr().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();

    let state = Arc::new(AppState::new(config));
    let router = Arc::new(build_router(&state));
    let shutdown = Arc::new(Notify::new());

    tokio::task::spawn_local(server::start_server_loop(
        listener,
        router,
        ServerOptions::from_config(config),
        Arc::clone(&shutdown),
    ));
    (addr, shutdown)
}

struct RawResponse {
    status: u16,
    head: String,
    body: String,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn send_raw(addr: SocketAddr, request: &str) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let status = head.split(' ').nth(1).unwrap().parse().unwrap();
    RawResponse {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

async fn get(addr: SocketAddr, path: &str) -> RawResponse {
    send_raw(
        addr,
        &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
    )
    .await
}

async fn post(addr: SocketAddr, path: &str, content_type: &str, body: &str) -> RawResponse {
    send_raw(
        addr,
        &format!(
            "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: {content_type}\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
    )
    .await
}

#[tokio::test]
async fn test_routes_over_tcp() {
    LocalSet::new()
        .run_until(async {
            let (addr, shutdown) = spawn_server(&test_config());

            let resp = get(addr, "/").await;
            assert_eq!(resp.status, 200);
            assert_eq!(resp.body, "Hello World!");

            let resp = get(addr, "/nonexistent").await;
            assert_eq!(resp.status, 404);
            assert_eq!(resp.body, "Not Found");

            let resp = get(addr, "/forms/post").await;
            assert_eq!(resp.status, 200);
            assert!(resp.header("content-type").unwrap().starts_with("text/html"));
            assert!(resp.body.contains("custname"));

            let resp = get(addr, "/health").await;
            assert_eq!(resp.status, 200);
            let health = resp.json();
            assert_eq!(health["status"], "healthy");
            assert_eq!(health["environment"], "test");
            assert!(health["uptime"].as_f64().unwrap() >= 0.0);

            assert_eq!(get(addr, "/health/").await.status, 404);

            shutdown.notify_one();
        })
        .await;
}

#[tokio::test]
async fn test_mirror_over_tcp() {
    LocalSet::new()
        .run_until(async {
            let (addr, shutdown) = spawn_server(&test_config());

            let resp = post(
                addr,
                "/post?debug=1",
                "application/x-www-form-urlencoded",
                "custname=John+Doe&topping=bacon&topping=cheese",
            )
            .await;
            assert_eq!(resp.status, 200);
            assert!(resp
                .header("content-type")
                .unwrap()
                .starts_with("application/json"));
            let value = resp.json();
            assert_eq!(value["form"]["custname"], serde_json::json!(["John Doe"]));
            assert_eq!(value["form"]["topping"], serde_json::json!(["bacon", "cheese"]));
            assert_eq!(value["args"], serde_json::json!({"debug": "1"}));
            assert_eq!(value["origin"], "127.0.0.1");
            assert_eq!(value["url"], "http://localhost/post?debug=1");
            assert_eq!(value["method"], "POST");
            assert_eq!(value["headers"]["Host"], serde_json::json!(["localhost"]));

            let raw = r#"{"invalid": json}"#;
            let value = post(addr, "/post", "application/json", raw).await.json();
            assert_eq!(value["json"], serde_json::Value::Null);
            assert_eq!(value["data"], raw);

            let resp = get(addr, "/post").await;
            assert_eq!(resp.status, 404);

            shutdown.notify_one();
        })
        .await;
}

#[tokio::test]
async fn test_probe_against_live_server() {
    LocalSet::new()
        .run_until(async {
            let (addr, shutdown) = spawn_server(&test_config());

            let client = ProbeClient::new(&format!("http://{addr}")).unwrap();
            let outcomes = probe::run_smoke_checks(&client).await;
            for outcome in &outcomes {
                assert!(outcome.passed(), "{}: {:?}", outcome.name, outcome.result);
            }

            shutdown.notify_one();
        })
        .await;
}

#[tokio::test]
async fn test_missing_form_file_is_404() {
    LocalSet::new()
        .run_until(async {
            let mut config = test_config();
            config.site.forms_post_file = "does-not-exist/forms-post.html".to_string();
            let (addr, shutdown) = spawn_server(&config);

            let resp = get(addr, "/forms/post").await;
            assert_eq!(resp.status, 404);

            // Other routes are unaffected
            assert_eq!(get(addr, "/").await.status, 200);

            shutdown.notify_one();
        })
        .await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    LocalSet::new()
        .run_until(async {
            let config = test_config();
            let listener =
                server::create_reusable_listener(config.get_socket_addr().unwrap()).unwrap();
            let state = Arc::new(AppState::new(&config));
            let shutdown = Arc::new(Notify::new());

            let server_task = tokio::task::spawn_local(server::start_server_loop(
                listener,
                Arc::new(build_router(&state)),
                ServerOptions::from_config(&config),
                Arc::clone(&shutdown),
            ));

            shutdown.notify_one();
            tokio::time::timeout(std::time::Duration::from_secs(5), server_task)
                .await
                .expect("server loop should exit after shutdown")
                .unwrap();
        })
        .await;
}
