use std::net::SocketAddr;
use std::path::PathBuf;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

use configs::AppConfig;
use server::startup::build_app;

struct TestApp {
    base_url: String,
    frontend: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.frontend);
    }
}

async fn start_server() -> anyhow::Result<TestApp> {
    // Isolated frontend dir per test run
    let frontend = std::env::temp_dir().join(format!("gps-frontend-{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(&frontend).await?;
    tokio::fs::write(frontend.join("index.html"), "<html><body>share location</body></html>").await?;
    tokio::fs::write(frontend.join("tracker.html"), "<html><body>tracker</body></html>").await?;

    let mut cfg = AppConfig::default();
    cfg.frontend.dir = frontend.to_string_lossy().into_owned();

    let app = build_app(&cfg);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = server::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url, frontend })
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("e2e-agent/1.0")
        .build()
        .expect("reqwest client")
}

#[tokio::test]
async fn e2e_pages_and_fallback() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = client();

    let res = c.get(format!("{}/", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert!(res.text().await?.contains("share location"));

    let res = c.get(format!("{}/tracker", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert!(res.text().await?.contains("tracker"));

    let res = c.get(format!("{}/no/such/page", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    assert!(res.text().await?.contains("share location"));

    let res = c.post(format!("{}/api/nope", app.base_url)).json(&json!({})).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    assert!(res.text().await?.contains("share location"));

    let res = c.delete(format!("{}/no/such/page", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    assert!(res.text().await?.contains("share location"));
    Ok(())
}

#[tokio::test]
async fn e2e_register_update_and_track() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = client();

    let res = c.post(format!("{}/api/register_user", app.base_url))
        .json(&json!({"name": " Ada ", "phone": "555-1234", "user_id": "u1"}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c.post(format!("{}/api/update_location", app.base_url))
        .json(&json!({"latitude": 37.7, "longitude": -122.4, "accuracy": 10, "user_id": "u1"}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["user_id"], "u1");

    let body = c.get(format!("{}/api/get_locations", app.base_url))
        .send().await?
        .json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "success");
    assert_eq!(body["count"], 1);
    let u1 = &body["locations"]["u1"];
    assert_eq!(u1["latitude"], 37.7);
    assert_eq!(u1["accuracy"], 10.0);
    assert_eq!(u1["user_agent"], "e2e-agent/1.0");
    assert_eq!(u1["contact"]["name"], "Ada");

    let body = c.get(format!("{}/api/export_contacts", app.base_url))
        .send().await?
        .json::<serde_json::Value>().await?;
    assert_eq!(body["total_registered"], 1);
    assert_eq!(body["contacts"][0]["has_location"], true);
    assert_eq!(body["contacts"][0]["last_location_update"], u1["timestamp"]);
    Ok(())
}

#[tokio::test]
async fn e2e_missing_user_id_uses_peer_address() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = client();

    let body = c.post(format!("{}/api/update_location", app.base_url))
        .json(&json!({"latitude": "1.5", "longitude": "2.5"}))
        .send().await?
        .json::<serde_json::Value>().await?;
    assert_eq!(body["user_id"], "127.0.0.1");

    let body = c.get(format!("{}/api/get_my_location", app.base_url))
        .send().await?
        .json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "success");
    assert_eq!(body["location"]["latitude"], 1.5);
    Ok(())
}

#[tokio::test]
async fn e2e_validation_errors() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = client();

    let res = c.post(format!("{}/api/register_user", app.base_url))
        .json(&json!({"phone": "555-1234"}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Missing name or phone number");

    let res = c.post(format!("{}/api/update_location", app.base_url))
        .json(&json!({"longitude": 1.0}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Missing latitude or longitude");

    let body = c.get(format!("{}/api/export_contacts", app.base_url))
        .send().await?
        .json::<serde_json::Value>().await?;
    assert_eq!(body["total_registered"], 0);
    Ok(())
}
