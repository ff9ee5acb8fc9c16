use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use team_balancer::server::router;

async fn post_solve(body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/teams/solve")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn players() -> Value {
    json!([
        { "name": "a", "skill": 30, "role": 1, "captain": true },
        { "name": "b", "skill": 10, "role": 1 },
        { "name": "c", "skill": 20, "role": 2, "avoid": "a" },
        { "name": "d", "skill": 40, "role": 2, "captain": true }
    ])
}

#[tokio::test(flavor = "multi_thread")]
async fn solves_a_small_roster() {
    let (status, body) = post_solve(json!({
        "players": players(),
        "config": { "roles": [1, 2], "workers": 1, "time_limit_secs": 10.0 }
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OPTIMAL");
    let teams = body["teams"].as_array().unwrap();
    assert_eq!(teams.len(), 2);
    for team in teams {
        assert_eq!(team["members"].as_array().unwrap().len(), 2);
    }
    // a+d vs b+c is 70/30, a+c vs b+d is 50/50
    assert_eq!(body["objective"]["balance"].as_f64(), Some(0.0));
    assert_eq!(body["conflicts"].as_array().unwrap().len(), 1);
    assert_eq!(body["conflicts"][0]["player"], "c");
    assert_eq!(body["conflicts"][0]["avoids"], "a");
    assert_eq!(body["conflicts"][0]["mutual"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_roster_is_a_bad_request() {
    let (status, body) = post_solve(json!({
        "players": [{ "name": "a", "skill": 1, "role": 1 }],
        "config": { "roles": [1, 2] }
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("role 2 has 0"));
}

#[tokio::test(flavor = "multi_thread")]
async fn colliding_presets_are_unprocessable() {
    let (status, body) = post_solve(json!({
        "players": players(),
        "config": { "roles": [1, 2], "workers": 1, "presets": { "a": 2, "b": 2 } }
    }))
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["cause"]["kind"], "preset_collision");
    assert_eq!(body["cause"]["team"], 2);
}
