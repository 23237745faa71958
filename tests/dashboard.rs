use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::{get, post};
use tokio::time::Duration;
use tower::ServiceExt;

use bench_link::axumstate::AxumState;
use bench_link::http::messages::{CommandResponse, LimitsMessage};
use bench_link::http::{get_heartbeat, get_limits, post_dashboard};

fn test_app() -> Router {
    // Simulated bench with no settle wait, same wiring as main
    let state = AxumState::simulated(Duration::ZERO);

    Router::new()
        .route("/heartbeat", get(get_heartbeat))
        .route("/limits", get(get_limits))
        .route("/dashboard", post(post_dashboard))
        .with_state(state)
}

async fn post_commands(app: &Router, commands: &[&str]) -> CommandResponse {
    let body = serde_json::json!({ "commands": commands }).to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/dashboard")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn full_dashboard_session() {
    let app = test_app();

    let reply = post_commands(&app, &["MAXV 10", "MAXC 3000", "SETV CH1, 5", "GETV 1"]).await;

    assert_eq!(reply.responses.len(), 4);
    assert_eq!(reply.responses[0], "Voltage Rating: 10");
    assert_eq!(reply.responses[1], "Current Rating: 3000");
    assert!(
        reply.responses[2].starts_with("Channel 1 Voltage set to"),
        "{}",
        reply.responses[2]
    );
    assert!(
        reply.responses[3].starts_with("Voltage at channel 1:"),
        "{}",
        reply.responses[3]
    );
}

#[tokio::test]
async fn unconfigured_session_returns_guidance() {
    let app = test_app();

    let reply = post_commands(&app, &["SETV CH1, 5"]).await;

    assert_eq!(
        reply.responses,
        vec!["use MAXV to set max voltage and MAXC to set max current"]
    );
}

#[tokio::test]
async fn errors_stay_in_their_batch_slot() {
    let app = test_app();

    let reply = post_commands(&app, &["MAXV 10", "FOO", "MAXC 3000", "SETV CH1, bad"]).await;

    assert_eq!(reply.responses.len(), 4);
    assert!(
        reply.responses[1].contains("command not found"),
        "{}",
        reply.responses[1]
    );
    assert_eq!(
        reply.responses[3],
        "Error processing SETV command: Invalid input values."
    );
}

#[tokio::test]
async fn voltage_test_passes_and_fails_on_bounds() {
    let app = test_app();

    let reply = post_commands(
        &app,
        &[
            "MAXV 30",
            "MAXC 3000",
            "TSTV CH2, 12, 10, 15",
            "TSTV CH2, 12, 20, 25",
        ],
    )
    .await;

    assert!(
        reply.responses[2].contains("Test Passed"),
        "{}",
        reply.responses[2]
    );
    assert!(
        reply.responses[3].contains("Test Failed"),
        "{}",
        reply.responses[3]
    );
}

#[tokio::test]
async fn malformed_batch_request_is_rejected() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/dashboard")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn heartbeat_is_alive() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/heartbeat")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("alive"));
}

#[tokio::test]
async fn limits_snapshot_tracks_the_session() {
    let app = test_app();

    let fetch_limits = |app: Router| async move {
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/limits")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice::<LimitsMessage>(&bytes).unwrap()
    };

    let before = fetch_limits(app.clone()).await;
    assert_eq!(before.max_voltage, None);
    assert_eq!(before.max_current_ma, None);

    post_commands(&app, &["MAXV 10", "MAXC 3000"]).await;

    let after = fetch_limits(app.clone()).await;
    assert!((after.max_voltage.unwrap() - 10.0).abs() < 1e-9);
    assert!((after.max_current_ma.unwrap() - 3000.0).abs() < 1e-9);
}
