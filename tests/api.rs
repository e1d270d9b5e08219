mod support;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::json;

use support::{send, send_request, test_app};

#[tokio::test]
async fn task_lifecycle_through_http() {
    let app = test_app();
    let router = &app.router;

    let created = send(
        router,
        Method::POST,
        "/tasks/",
        Some(json!({"title": "A", "description": "B"})),
    )
    .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(
        created.body,
        json!({"id": 1, "title": "A", "description": "B", "completed": false})
    );

    let first = send(router, Method::GET, "/tasks/1", None).await;
    let second = send(router, Method::GET, "/tasks/1", None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
    assert_eq!(app.store.reads(), 1, "second read is served from the cache");

    let listed_before = send(router, Method::GET, "/tasks/?skip=0&limit=10", None).await;
    assert_eq!(listed_before.body, json!([created.body]));

    let updated = send(
        router,
        Method::PUT,
        "/tasks/1",
        Some(json!({"title": "C", "description": "D", "completed": true})),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(
        updated.body,
        json!({"id": 1, "title": "C", "description": "D", "completed": true})
    );

    let reread = send(router, Method::GET, "/tasks/1", None).await;
    assert_eq!(reread.body, updated.body);

    let listed_after = send(router, Method::GET, "/tasks/?skip=0&limit=10", None).await;
    assert_ne!(listed_before.body, listed_after.body);
    assert_eq!(listed_after.body, json!([updated.body]));

    let deleted = send(router, Method::DELETE, "/tasks/1", None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = send(router, Method::GET, "/tasks/1", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"]["code"], "not_found");

    let listed_final = send(router, Method::GET, "/tasks/", None).await;
    assert_eq!(listed_final.body, json!([]));
}

#[tokio::test]
async fn patch_toggles_completion_only() {
    let app = test_app();
    send(
        &app.router,
        Method::POST,
        "/tasks",
        Some(json!({"title": "A", "description": "B"})),
    )
    .await;

    let patched = send(
        &app.router,
        Method::PATCH,
        "/tasks/1",
        Some(json!({"completed": true})),
    )
    .await;

    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(
        patched.body,
        json!({"id": 1, "title": "A", "description": "B", "completed": true})
    );
}

#[tokio::test]
async fn collection_is_served_with_and_without_trailing_slash() {
    let app = test_app();
    for uri in ["/tasks", "/tasks/"] {
        let response = send(
            &app.router,
            Method::POST,
            uri,
            Some(json!({"title": uri, "description": "d"})),
        )
        .await;
        assert_eq!(response.status, StatusCode::OK, "POST {uri}");
    }

    let bare = send(&app.router, Method::GET, "/tasks", None).await;
    let slashed = send(&app.router, Method::GET, "/tasks/", None).await;
    assert_eq!(bare.status, StatusCode::OK);
    assert_eq!(bare.body, slashed.body);
    assert_eq!(bare.body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn list_windows_default_and_slice() {
    let app = test_app();
    for n in 0..12 {
        send(
            &app.router,
            Method::POST,
            "/tasks/",
            Some(json!({"title": format!("t{n}"), "description": "d"})),
        )
        .await;
    }

    let default_window = send(&app.router, Method::GET, "/tasks/", None).await;
    assert_eq!(default_window.body.as_array().map(Vec::len), Some(10));
    assert_eq!(default_window.body[0]["id"], 1);

    let tail = send(&app.router, Method::GET, "/tasks/?skip=10&limit=5", None).await;
    let ids: Vec<_> = tail
        .body
        .as_array()
        .expect("array body")
        .iter()
        .map(|task| task["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(11), json!(12)]);
}

#[tokio::test]
async fn missing_ids_yield_404_for_every_method() {
    let app = test_app();

    let get = send(&app.router, Method::GET, "/tasks/42", None).await;
    let put = send(
        &app.router,
        Method::PUT,
        "/tasks/42",
        Some(json!({"title": "t", "description": "d", "completed": false})),
    )
    .await;
    let patch = send(
        &app.router,
        Method::PATCH,
        "/tasks/42",
        Some(json!({"completed": true})),
    )
    .await;
    let delete = send(&app.router, Method::DELETE, "/tasks/42", None).await;

    for response in [get, put, patch, delete] {
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["error"]["code"], "not_found");
    }
    assert!(app.cache.is_empty());
}

#[tokio::test]
async fn invalid_bodies_are_rejected_with_field_errors() {
    let app = test_app();

    let null_title = send(
        &app.router,
        Method::POST,
        "/tasks/",
        Some(json!({"title": null, "description": "d"})),
    )
    .await;
    assert_eq!(null_title.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(null_title.body["error"]["code"], "validation_error");
    assert_eq!(null_title.body["error"]["details"][0]["field"], "title");

    let bad_completed = send(
        &app.router,
        Method::PATCH,
        "/tasks/1",
        Some(json!({"completed": "yes"})),
    )
    .await;
    assert_eq!(bad_completed.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(bad_completed.body["error"]["details"][0]["field"], "completed");

    let missing_fields = send(
        &app.router,
        Method::PUT,
        "/tasks/1",
        Some(json!({"title": "t"})),
    )
    .await;
    assert_eq!(missing_fields.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<_> = missing_fields.body["error"]["details"]
        .as_array()
        .expect("details")
        .iter()
        .map(|detail| detail["field"].as_str().unwrap_or_default().to_string())
        .collect();
    assert!(fields.contains(&"description".to_string()));
    assert!(fields.contains(&"completed".to_string()));
}

#[tokio::test]
async fn nul_characters_in_text_fields_are_rejected() {
    let app = test_app();

    let response = send(
        &app.router,
        Method::POST,
        "/tasks/",
        Some(json!({"title": "bad\0title", "description": "d"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"]["details"][0]["field"], "title");
    let listed = send(&app.router, Method::GET, "/tasks/", None).await;
    assert_eq!(listed.body, json!([]));
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tasks/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .expect("request should build");

    let response = send_request(&app.router, request).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"]["details"][0]["field"], "body");
}

#[tokio::test]
async fn bad_path_and_query_values_are_rejected() {
    let app = test_app();

    let bad_id = send(&app.router, Method::GET, "/tasks/abc", None).await;
    assert_eq!(bad_id.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(bad_id.body["error"]["details"][0]["field"], "id");

    let bad_limit = send(&app.router, Method::GET, "/tasks/?limit=-1", None).await;
    assert_eq!(bad_limit.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(bad_limit.body["error"]["details"][0]["field"], "limit");

    assert_eq!(app.store.reads(), 0);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = test_app();

    let ok = send(&app.router, Method::GET, "/tasks/", None).await;
    let missing = send(&app.router, Method::GET, "/tasks/9", None).await;

    let ok_id = ok.request_id.expect("request id on success");
    let missing_id = missing.request_id.expect("request id on error");
    assert_ne!(ok_id, missing_id);
}

#[tokio::test]
async fn health_reports_store_status() {
    let app = test_app();
    let response = send(&app.router, Method::GET, "/health", None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unknown_routes_use_error_body() {
    let app = test_app();
    let response = send(&app.router, Method::GET, "/nope", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"]["code"], "not_found");
}
