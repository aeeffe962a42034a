use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use party_tracker_back::{
    config::{AdminConfig, AppConfig},
    routes,
    state::{AppState, SharedState, notification_queue::QueueSettings},
};

const PIN: &str = "4242";

fn state_with_pin(pin: Option<&str>) -> SharedState {
    AppState::new(AppConfig {
        popup: QueueSettings::default(),
        admin: AdminConfig {
            pin: pin.map(str::to_owned),
            token_secret: b"integration-secret".to_vec(),
            token_ttl: Duration::from_secs(600),
        },
    })
}

fn app_with_pin(pin: Option<&str>) -> Router {
    routes::router(state_with_pin(pin))
}

fn app() -> Router {
    app_with_pin(Some(PIN))
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header("x-admin-token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-admin-token", token);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        json_request("POST", "/admin/verify-pin", None, json!({ "pin": PIN })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn healthcheck_reports_ok() {
    let (status, body) = send(&app(), empty_request("GET", "/healthcheck", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tv_sessions"], 0);
}

#[tokio::test]
async fn verify_pin_rejects_wrong_pin() {
    let (status, _) = send(
        &app(),
        json_request("POST", "/admin/verify-pin", None, json!({ "pin": "0000" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verify_pin_without_configured_pin_is_unavailable() {
    let (status, _) = send(
        &app_with_pin(None),
        json_request("POST", "/admin/verify-pin", None, json!({ "pin": PIN })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn verify_pin_returns_token_and_expiry() {
    let (status, body) = send(
        &app(),
        json_request("POST", "/admin/verify-pin", None, json!({ "pin": " 4242 " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().unwrap().contains('.'));
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn host_routes_require_a_valid_token() {
    let app = app();
    let popup = json!({ "player_name": "Roman", "points": 3 });

    let (status, _) = send(
        &app,
        json_request("POST", "/parties/WM40/tv/popups", None, popup.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request("POST", "/parties/WM40/tv/popups", Some("forged.token"), popup),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn enqueued_popups_show_in_order() {
    let app = app();
    let token = login(&app).await;

    let (status, first) = send(
        &app,
        json_request(
            "POST",
            "/parties/wm40/tv/popups",
            Some(&token),
            json!({ "player_name": "Roman", "points": 3, "label": "Main event" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["outcome"], "showing");

    let (_, second) = send(
        &app,
        json_request(
            "POST",
            "/parties/WM40/tv/popups",
            Some(&token),
            json!({ "player_name": "Cody", "points": -1 }),
        ),
    )
    .await;
    assert_eq!(second["outcome"], "queued");
    assert_eq!(second["position"], 0);

    let (status, snapshot) = send(&app, empty_request("GET", "/parties/WM40/tv", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["party_code"], "WM40");
    assert_eq!(snapshot["phase"], "showing");
    assert_eq!(snapshot["pending"], 1);
    assert_eq!(snapshot["current"]["player_name"], "Roman");
    assert_eq!(snapshot["current"]["label"], "Main event");
    assert_eq!(snapshot["current"]["id"], first["id"]);
}

#[tokio::test]
async fn clear_and_close_reset_the_tv() {
    let app = app();
    let token = login(&app).await;

    let (status, _) = send(
        &app,
        empty_request("DELETE", "/parties/PARTY/tv/popups", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(
        &app,
        json_request(
            "POST",
            "/parties/PARTY/tv/popups",
            Some(&token),
            json!({ "player_name": "Liv", "points": 2 }),
        ),
    )
    .await;

    let (status, _) = send(
        &app,
        empty_request("DELETE", "/parties/PARTY/tv/popups", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, snapshot) = send(&app, empty_request("GET", "/parties/PARTY/tv", None)).await;
    assert_eq!(snapshot["phase"], "idle");
    assert!(snapshot.get("current").is_none());

    let (status, _) = send(
        &app,
        empty_request("DELETE", "/parties/PARTY/tv/session", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, health) = send(&app, empty_request("GET", "/healthcheck", None)).await;
    assert_eq!(health["tv_sessions"], 0);
}

#[tokio::test]
async fn invalid_popup_and_party_code_are_bad_requests() {
    let app = app();
    let token = login(&app).await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/parties/WM40/tv/popups",
            Some(&token),
            json!({ "player_name": "", "points": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, empty_request("GET", "/parties/W!/tv", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn validation_errors_use_the_json_error_body() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        json_request("POST", "/admin/verify-pin", None, json!({ "pin": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("pin"));

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/parties/WM40/tv/popups",
            Some(&token),
            json!({ "player_name": "", "points": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("player_name")
    );
}

/// Reads `event:`/`data:` blocks off an SSE response body, skipping keep-alive comments.
struct SseReader {
    body: Body,
    buffer: String,
}

impl SseReader {
    fn new(body: Body) -> Self {
        Self {
            body,
            buffer: String::new(),
        }
    }

    async fn next_event(&mut self) -> Option<(String, Value)> {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(..end + 2).collect();
                if block.starts_with(':') {
                    continue;
                }
                let mut name = String::new();
                let mut data = String::new();
                for line in block.lines() {
                    if let Some(value) = line.strip_prefix("event:") {
                        name = value.trim_start().to_owned();
                    } else if let Some(value) = line.strip_prefix("data:") {
                        data.push_str(value.trim_start());
                    }
                }
                return Some((name, serde_json::from_str(&data).unwrap()));
            }

            let frame = self.body.frame().await?.unwrap();
            if let Ok(bytes) = frame.into_data() {
                self.buffer.push_str(std::str::from_utf8(&bytes).unwrap());
            }
        }
    }

    async fn expect(&mut self, name: &str) -> Value {
        let (event, data) = self.next_event().await.expect("stream ended early");
        assert_eq!(event, name, "unexpected event with data {data}");
        data
    }
}

async fn open_tv_stream(app: &Router, code: &str) -> SseReader {
    let response = app
        .clone()
        .oneshot(empty_request("GET", &format!("/sse/parties/{code}/tv"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    SseReader::new(response.into_body())
}

async fn push_popup(app: &Router, token: &str, code: &str, name: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            &format!("/parties/{code}/tv/popups"),
            Some(token),
            json!({ "player_name": name, "points": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test(start_paused = true)]
async fn tv_stream_follows_popups_until_the_session_closes() {
    let state = state_with_pin(Some(PIN));
    let app = routes::router(state.clone());
    let token = login(&app).await;

    let mut tv = open_tv_stream(&app, "wm40").await;
    let connected = tv.expect("tv.connected").await;
    assert_eq!(connected["party_code"], "WM40");
    assert_eq!(connected["phase"], "idle");

    let a = push_popup(&app, &token, "WM40", "Roman").await;
    let shown = tv.expect("popup.show").await;
    assert_eq!(shown["id"], a["id"]);
    assert_eq!(shown["player_name"], "Roman");

    let hidden = tv.expect("popup.hide").await;
    assert_eq!(hidden["id"], a["id"]);

    let b = push_popup(&app, &token, "WM40", "Cody").await;
    assert_eq!(tv.expect("popup.show").await["id"], b["id"]);

    // Clear and enqueue back to back: the display still sees B go away first.
    let (status, _) = send(
        &app,
        empty_request("DELETE", "/parties/WM40/tv/popups", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let c = push_popup(&app, &token, "WM40", "Jey").await;

    assert_eq!(tv.expect("popup.hide").await["id"], b["id"]);
    assert_eq!(tv.expect("popup.show").await["id"], c["id"]);

    let (status, _) = send(
        &app,
        empty_request("DELETE", "/parties/WM40/tv/session", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(tv.expect("tv.closed").await["party_code"], "WM40");
    assert!(tv.next_event().await.is_none());
    assert!(state.tv().is_empty());
}

#[tokio::test(start_paused = true)]
async fn tv_stream_connects_mid_popup() {
    let app = app();
    let token = login(&app).await;
    let a = push_popup(&app, &token, "SMACK", "Bianca").await;
    push_popup(&app, &token, "SMACK", "Rhea").await;

    let mut tv = open_tv_stream(&app, "SMACK").await;
    let connected = tv.expect("tv.connected").await;
    assert_eq!(connected["phase"], "showing");
    assert_eq!(connected["current"]["id"], a["id"]);
    assert_eq!(connected["pending"], 1);

    assert_eq!(tv.expect("popup.hide").await["id"], a["id"]);
    assert_eq!(tv.expect("popup.show").await["player_name"], "Rhea");
}

#[tokio::test(start_paused = true)]
async fn disconnected_tv_streams_do_not_leave_sessions_behind() {
    let state = state_with_pin(Some(PIN));
    let app = routes::router(state.clone());
    let token = login(&app).await;

    for index in 0..50 {
        let mut tv = open_tv_stream(&app, &format!("IDLE{index}")).await;
        tv.expect("tv.connected").await;
    }
    push_popup(&app, &token, "BUSY", "Liv").await;
    let mut busy = open_tv_stream(&app, "BUSY").await;
    busy.expect("tv.connected").await;
    drop(busy);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(state.tv().len(), 1);
    assert!(state.tv().get("BUSY").is_some());
}
