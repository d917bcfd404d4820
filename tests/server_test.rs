use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use sudoku_relay::Relay;
use sudoku_relay::collaborator::mock::{MockCollaborator, Reply};
use sudoku_relay::config::{CollaboratorConfig, InputLimits, RelayConfig};
use sudoku_relay::server::build_router;

fn app(extractor: Vec<Reply>, solver: Vec<Reply>) -> axum::Router {
    let relay = Relay::new(
        Arc::new(MockCollaborator::new("extractor", extractor)),
        Arc::new(MockCollaborator::new("solver", solver)),
        InputLimits::default(),
    );
    build_router(Arc::new(relay))
}

fn output(text: &str) -> Vec<Reply> {
    vec![Reply::Output(text.to_string())]
}

/// Send a request and return (status, parsed JSON body).
async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn ping_returns_fixed_message() {
    let (status, body) = send(app(vec![], vec![]), get("/ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "msg": "teste ping ok" }));
}

#[tokio::test]
async fn ping_is_unaffected_by_earlier_requests() {
    let app = app(output("12"), output("solved"));
    send(app.clone(), post_json("/extract", serde_json::json!({ "path": "/a.png" }))).await;
    send(app.clone(), post_json("/resolve", serde_json::json!({ "board": "B" }))).await;

    let (status, body) = send(app, get("/ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "teste ping ok");
}

#[tokio::test]
async fn extract_returns_flattened_board() {
    let (status, body) = send(
        app(output("1 2\n3 4\n"), vec![]),
        post_json("/extract", serde_json::json!({ "path": "/img/sudoku.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "board": "1   2 ,3   4 " }));
}

#[tokio::test]
async fn extract_accepts_form_bodies() {
    let (status, body) = send(
        app(output("12"), vec![]),
        post_form("/extract", "path=%2Fimg%2Fsudoku.png"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["board"], "1 2 ");
}

#[tokio::test]
async fn resolve_returns_solver_output_verbatim() {
    let solution = "[[5, 3, 4], [6, 7, 2]]\n";
    let (status, body) = send(
        app(vec![], output(solution)),
        post_json("/resolve", serde_json::json!({ "board": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolution"], solution);
}

#[tokio::test]
async fn resolve_accepts_form_bodies() {
    let (status, body) = send(
        app(vec![], output("ok")),
        post_form("/resolve", "board=5+3+0%2C6+0+0"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolution"], "ok");
}

#[tokio::test]
async fn empty_path_is_bad_request() {
    let (status, body) = send(
        app(output("never"), vec![]),
        post_json("/extract", serde_json::json!({ "path": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("path"));
}

#[tokio::test]
async fn missing_field_is_client_error() {
    let (status, body) = send(
        app(vec![], vec![]),
        post_json("/resolve", serde_json::json!({ "grid": "B" })),
    )
    .await;
    assert!(status.is_client_error(), "status {status}");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_json_is_client_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/extract")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app(vec![], vec![]), request).await;
    assert!(status.is_client_error(), "status {status}");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn timeout_is_gateway_timeout() {
    let (status, body) = send(
        app(vec![Reply::Timeout(Duration::from_secs(120))], vec![]),
        post_json("/extract", serde_json::json!({ "path": "/a.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn spawn_failure_is_internal_error() {
    let (status, _) = send(
        app(vec![], vec![Reply::SpawnError]),
        post_json("/resolve", serde_json::json!({ "board": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn solver_failure_is_bad_gateway() {
    let (status, body) = send(
        app(
            vec![],
            vec![Reply::Failed {
                code: 1,
                stderr: "Input problem is not solvable.".to_string(),
            }],
        ),
        post_json("/resolve", serde_json::json!({ "board": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("not solvable"));
}

#[tokio::test]
async fn failure_body_hides_traceback_details() {
    let traceback = "Traceback (most recent call last):\n  File \"/srv/relay/elements_board_extractor.py\", line 21, in <module>\nurllib.error.URLError: <urlopen error unknown url type>\n";
    let (status, body) = send(
        app(
            vec![Reply::Failed {
                code: 1,
                stderr: traceback.to_string(),
            }],
            vec![],
        ),
        post_json("/extract", serde_json::json!({ "path": "nope.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let error = body["error"].as_str().unwrap();
    assert!(error.ends_with("urllib.error.URLError: <urlopen error unknown url type>"));
    assert!(!error.contains("/srv/relay"));
    assert!(!error.contains("Traceback"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let resp = app(vec![], vec![]).oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_preflight_mirrors_origin_with_credentials() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/extract")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let resp = app(vec![], vec![]).oneshot(request).await.unwrap();

    assert!(resp.status().is_success());
    let headers = resp.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );
}

#[tokio::test]
async fn cors_headers_on_simple_request() {
    let request = Request::builder()
        .uri("/ping")
        .header("origin", "https://sudoku.example")
        .body(Body::empty())
        .unwrap();
    let resp = app(vec![], vec![]).oneshot(request).await.unwrap();
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "https://sudoku.example"
    );
}

/// Real child processes behind the real router.
fn sh(script: &str, prefix: &str) -> CollaboratorConfig {
    CollaboratorConfig {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string(), "sh".to_string()],
        argument_prefix: prefix.to_string(),
        working_dir: None,
        timeout: Duration::from_secs(5),
        max_output_bytes: 4096,
    }
}

fn process_app(extractor: CollaboratorConfig, solver: CollaboratorConfig) -> axum::Router {
    let config = RelayConfig {
        extractor,
        solver,
        ..RelayConfig::default()
    };
    build_router(Arc::new(Relay::from_config(&config)))
}

#[tokio::test]
async fn end_to_end_extract_and_resolve() {
    let app = process_app(
        sh("printf '530\\n600\\n'", "--pathImage="),
        sh("printf 'solved:%s' \"$1\"", ""),
    );

    let (status, body) = send(
        app.clone(),
        post_json("/extract", serde_json::json!({ "path": "/img.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["board"], "5 3 0 ,6 0 0 ");

    let (status, body) = send(
        app,
        post_json("/resolve", serde_json::json!({ "board": "5 3 0 ,6 0 0 " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolution"], "solved:5 3 0 ,6 0 0 ");
}

#[tokio::test]
async fn end_to_end_timeout_does_not_hang() {
    let app = process_app(
        CollaboratorConfig {
            timeout: Duration::from_millis(200),
            ..sh("sleep 10", "--pathImage=")
        },
        sh("true", ""),
    );
    let (status, _) = send(
        app,
        post_json("/extract", serde_json::json!({ "path": "/img.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}
