//! GoTrue auth endpoints.

use serde::Serialize;
use serde_json::Value;

use super::{SupabaseClient, check_status};
use crate::auth_events::AuthChange;
use crate::backend::{BackendResult, SignUpOutcome};
use crate::error::BackendError;
use crate::session::{Session, now_secs};

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Parses a token response into a session.
fn parse_session(body: &str) -> BackendResult<Session> {
    serde_json::from_str::<Session>(body)
        .map(|s| s.normalized(now_secs()))
        .map_err(|e| BackendError::Decode(format!("session: {e}")))
}

impl SupabaseClient {
    pub(super) async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> BackendResult<SignUpOutcome> {
        let resp = self
            .http
            .post(format!("{}/signup", self.auth_url()))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;
        let body = check_status(resp).await?.text().await?;

        // With email confirmation enabled the service returns only the user;
        // otherwise it returns a full session.
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| BackendError::Decode(format!("sign-up: {e}")))?;
        if value.get("access_token").is_none() {
            tracing::info!("Sign-up accepted, awaiting email confirmation");
            return Ok(SignUpOutcome::ConfirmationRequired);
        }

        let session = parse_session(&body)?;
        tracing::info!("Sign-up returned a session");
        self.set_session(Some(session.clone()));
        self.events.emit(&AuthChange::signed_in(session));
        Ok(SignUpOutcome::SignedIn)
    }

    pub(super) async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> BackendResult<Session> {
        let resp = self
            .http
            .post(format!("{}/token", self.auth_url()))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;
        let body = check_status(resp).await?.text().await?;
        let session = parse_session(&body)?;

        tracing::info!("Signed in");
        self.set_session(Some(session.clone()));
        self.events.emit(&AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    pub(super) async fn refresh(&self) -> BackendResult<Session> {
        let refresh_token = self
            .restore_session()
            .map(|s| s.refresh_token)
            .filter(|t| !t.is_empty())
            .ok_or(BackendError::NotSignedIn)?;

        let resp = self
            .http
            .post(format!("{}/token", self.auth_url()))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .json(&RefreshGrant {
                refresh_token: &refresh_token,
            })
            .send()
            .await?;
        let body = check_status(resp).await?.text().await?;
        let session = parse_session(&body)?;

        tracing::debug!("Session refreshed");
        self.set_session(Some(session.clone()));
        self.events.emit(&AuthChange::token_refreshed(session.clone()));
        Ok(session)
    }

    pub(super) async fn sign_out_session(&self) -> BackendResult<()> {
        if let Some(session) = self.restore_session() {
            let result = self
                .http
                .post(format!("{}/logout", self.auth_url()))
                .header("apikey", &self.anon_key)
                .header("Authorization", format!("Bearer {}", session.access_token))
                .send()
                .await;
            match result {
                Ok(resp) => match check_status(resp).await {
                    Ok(_) => {}
                    // The token is already invalid server-side; finish locally.
                    Err(BackendError::Api { status, .. })
                        if matches!(status, 401 | 403 | 404) => {}
                    Err(e) => return Err(e),
                },
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!("Signed out");
        self.set_session(None);
        self.events.emit(&AuthChange::signed_out());
        Ok(())
    }
}
