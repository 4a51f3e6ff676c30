//! HTTP surface: routing, status codes, and JSON shapes.

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use calcuingo_backend::routes::build_router;

use common::{fill_blank_exercise, memory_state};

struct TestApp {
    router: Router,
    fill_blank_id: i64,
}

fn app() -> TestApp {
    let state = memory_state();
    let fill_blank_id = fill_blank_exercise(state.engine.store()).id;
    TestApp { router: build_router(Arc::new(state)), fill_blank_id }
}

impl TestApp {
    async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = self.router.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    async fn register(&self, username: &str) -> i64 {
        let (status, body) = self
            .call("POST", "/api/v1/auth/register", Some(json!({ "username": username, "password": "pw" })))
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        body["learnerId"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = app.call("GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["app"], json!("Calcuingo"));
}

#[tokio::test]
async fn test_submit_flow_and_stats() {
    let app = app();
    let learner = app.register("ada").await;

    let submit = json!({ "learnerId": learner, "exerciseId": app.fill_blank_id, "answer": 14 });
    let (status, wrong) = app.call("POST", "/api/v1/lessons/1/submit", Some(submit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wrong["isCorrect"], json!(false));
    assert_eq!(wrong["hint"], json!("Substitute x = 5 into the function"));

    let submit = json!({ "learnerId": learner, "exerciseId": app.fill_blank_id, "answer": " 13 " });
    let (_, right) = app.call("POST", "/api/v1/lessons/1/submit", Some(submit.clone())).await;
    assert_eq!(right["isCorrect"], json!(true));
    assert_eq!(right["xpAwarded"], json!(10));
    assert!(right.get("hint").is_none());

    let (_, again) = app.call("POST", "/api/v1/lessons/1/submit", Some(submit)).await;
    assert_eq!(again["xpAwarded"], json!(0));
    assert_eq!(again["totalXp"], json!(10));

    let (status, stats) = app.call("GET", &format!("/api/v1/learners/{learner}/stats"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["xp"], json!(10));
    assert_eq!(stats["totalAttempts"], json!(3));
    assert_eq!(stats["completedLessons"], json!(1));
    assert_eq!(stats["totalLessons"], json!(6));
    assert_eq!(stats["badges"], json!(["First Steps"]));
}

#[tokio::test]
async fn test_submit_errors() {
    let app = app();
    let learner = app.register("ada").await;

    let unknown = json!({ "learnerId": learner, "exerciseId": 9999, "answer": "13" });
    let (status, body) = app.call("POST", "/api/v1/lessons/1/submit", Some(unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("exercise 9999"));

    let missing = json!({ "learnerId": learner, "exerciseId": app.fill_blank_id });
    let (status, _) = app.call("POST", "/api/v1/lessons/1/submit", Some(missing)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = json!({ "learnerId": learner, "exerciseId": app.fill_blank_id, "answer": { "x": 1 } });
    let (status, _) = app.call("POST", "/api/v1/lessons/1/submit", Some(malformed)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("POST", "/api/v1/lessons/1/submit", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // None of the rejected requests counted as an attempt.
    let (_, stats) = app.call("GET", &format!("/api/v1/learners/{learner}/stats"), None).await;
    assert_eq!(stats["totalAttempts"], json!(0));
}

#[tokio::test]
async fn test_login_and_touch() {
    let app = app();
    let learner = app.register("ada").await;

    let (status, login) = app
        .call("POST", "/api/v1/auth/login", Some(json!({ "username": "ada", "password": "pw" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["learnerId"], json!(learner));
    assert_eq!(login["streak"], json!(1));

    let (status, _) = app
        .call("POST", "/api/v1/auth/login", Some(json!({ "username": "ada", "password": "nope" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Same fixed clock: a second touch is a same-day login.
    let (status, touch) = app.call("POST", &format!("/api/v1/learners/{learner}/touch"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(touch["streak"], json!(1));

    let (status, _) = app.call("POST", "/api/v1/learners/404/touch", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_path_and_lesson_detail() {
    let app = app();
    let learner = app.register("ada").await;

    let (status, path) = app.call("GET", &format!("/api/v1/path?learnerId={learner}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let nodes = path.as_array().unwrap();
    assert_eq!(nodes.len(), 6);
    assert_eq!(nodes[0]["title"], json!("Functions & Graphs"));
    assert_eq!(nodes[1]["prerequisites"], json!([1]));
    assert!(nodes[0]["progress"].is_null());

    let (status, detail) = app.call("GET", "/api/v1/lessons/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let exercises = detail["exercises"].as_array().unwrap();
    assert_eq!(exercises.len(), 2);
    assert_eq!(exercises[0]["kind"], json!("multiple_choice"));
    assert!(exercises.iter().all(|e| e.get("answer").is_none()));

    assert!(detail.get("progress").is_none());

    let (status, _) = app.call("GET", "/api/v1/lessons/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_complete_lesson_and_detail_progress() {
    let app = app();
    let learner = app.register("ada").await;
    let uri = format!("/api/v1/learners/{learner}/lessons/1/complete");

    let (status, done) = app.call("POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["xpAwarded"], json!(10));
    assert_eq!(done["newlyCompleted"], json!(true));
    assert_eq!(done["newBadges"], json!(["First Steps"]));

    let (_, again) = app.call("POST", &uri, None).await;
    assert_eq!(again["xpAwarded"], json!(0));
    assert_eq!(again["totalXp"], json!(10));

    let (status, detail) = app.call("GET", &format!("/api/v1/lessons/1?learnerId={learner}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["progress"]["completed"], json!(true));
    assert_eq!(detail["progress"]["attempts"], json!(0));

    let (status, _) = app.call("POST", &format!("/api/v1/learners/{learner}/lessons/99/complete"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call("POST", "/api/v1/learners/404/lessons/1/complete", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
