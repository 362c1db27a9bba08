//! Shared helpers for backend client integration tests.

#![allow(dead_code)]

use serde_json::{Value, json};
use taskdeck_core::{Session, SessionStore, SupabaseClient, User};
use tempfile::TempDir;
use wiremock::{MockServer, ResponseTemplate};

pub const ANON_KEY: &str = "anon-key";

/// GoTrue token response for `email`.
pub fn session_body(email: &str, access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": chrono::Utc::now().timestamp() + 3600,
        "refresh_token": format!("{access_token}-refresh"),
        "user": {"id": "user-1", "email": email}
    })
}

pub fn session_response(email: &str, access_token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(session_body(email, access_token))
}

/// A stored session that expires `expires_in_secs` from now.
pub fn stored_session(email: &str, access_token: &str, expires_in_secs: i64) -> Session {
    Session {
        access_token: access_token.to_string(),
        refresh_token: format!("{access_token}-refresh"),
        token_type: Some("bearer".to_string()),
        expires_in: Some(3600),
        expires_at: Some(chrono::Utc::now().timestamp() + expires_in_secs),
        user: User {
            id: "user-1".to_string(),
            email: Some(email.to_string()),
        },
    }
}

/// Client pointed at the mock server with a session file in a temp dir.
pub fn client_for(server: &MockServer, dir: &TempDir) -> (SupabaseClient, SessionStore) {
    let store = SessionStore::new(dir.path().join("session.json"));
    let client =
        SupabaseClient::new(&server.uri(), ANON_KEY).with_session_store(store.clone());
    (client, store)
}
