//! Integration tests for task table operations.

mod fixtures;

use fixtures::{ANON_KEY, client_for, stored_session};
use serde_json::json;
use taskdeck_core::{Backend, BackendError, NewTask, SupabaseClient, TaskId, TaskPatch};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client with a valid session for `a@b.com` already loaded.
async fn signed_in_client(server: &MockServer, dir: &TempDir) -> SupabaseClient {
    let (client, store) = client_for(server, dir);
    store
        .save(&stored_session("a@b.com", "user-token", 3600))
        .unwrap();
    assert!(client.current_session().await.is_some());
    client
}

#[tokio::test]
async fn test_list_tasks_filters_by_owner_and_orders_by_id() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let client = signed_in_client(&server, &dir).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("select", "*"))
        .and(query_param("email", "eq.a@b.com"))
        .and(query_param("order", "id.asc"))
        .and(header("apikey", ANON_KEY))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Buy milk", "description": null, "email": "a@b.com"},
            {"id": 2, "title": "Walk dog", "description": "at 6", "email": "a@b.com"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let tasks = client.list_tasks("a@b.com").await.unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, TaskId::new("1"));
    assert_eq!(tasks[0].description, "");
    assert_eq!(tasks[1].title, "Walk dog");
    assert_eq!(tasks[1].description, "at 6");
}

#[tokio::test]
async fn test_list_tasks_error_is_api_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let client = signed_in_client(&server, &dir).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "PGRST301",
            "message": "JWT expired"
        })))
        .mount(&server)
        .await;

    let err = client.list_tasks("a@b.com").await.unwrap_err();
    assert!(matches!(err, BackendError::Api { status: 401, .. }));
    assert_eq!(err.to_string(), "JWT expired");
}

#[tokio::test]
async fn test_list_tasks_rejects_malformed_body() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let client = signed_in_client(&server, &dir).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\": \"a list\"}"))
        .mount(&server)
        .await;

    let err = client.list_tasks("a@b.com").await.unwrap_err();
    assert!(matches!(err, BackendError::Decode(_)));
}

#[tokio::test]
async fn test_insert_task_posts_single_row() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let client = signed_in_client(&server, &dir).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/tasks"))
        .and(header("Authorization", "Bearer user-token"))
        .and(body_json(json!([
            {"title": "Buy milk", "description": "", "email": "a@b.com"}
        ])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client
        .insert_task(&NewTask {
            title: "Buy milk".into(),
            description: String::new(),
            email: "a@b.com".into(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_task_patches_by_id() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let client = signed_in_client(&server, &dir).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("id", "eq.5"))
        .and(body_json(json!({"title": "Buy bread", "description": "whole grain"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .update_task(
            &TaskId::new("5"),
            &TaskPatch {
                title: "Buy bread".into(),
                description: "whole grain".into(),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_task_by_id() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let client = signed_in_client(&server, &dir).await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("id", "eq.7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_task(&TaskId::new("7")).await.unwrap();
}

#[tokio::test]
async fn test_custom_table_name() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let client = signed_in_client(&server, &dir).await.with_table("todo_items");

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/todo_items"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_task(&TaskId::new("1")).await.unwrap();
}

#[tokio::test]
async fn test_signed_out_requests_use_anon_key() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (client, _store) = client_for(&server, &dir);

    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .and(header("Authorization", format!("Bearer {ANON_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.list_tasks("a@b.com").await.unwrap().is_empty());
}
