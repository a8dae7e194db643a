//! Verification of the session tokens issued by the identity provider.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts},
    Json,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub exp: usize,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Caller identity taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let claims = verify_token(token.trim(), &state.config.jwt_secret).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            ApiError::Unauthorized
        })?;

        if claims.email.trim().is_empty() {
            return Err(ApiError::Unauthorized);
        }

        Ok(AuthUser {
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
        })
    }
}

/// Creates the caller's user row on first sign-in and keeps the profile
/// fields current afterwards.
pub async fn sync_user_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let saved = state
        .trips
        .upsert_user(&user.email, user.name.as_deref(), user.picture.as_deref())
        .await?;

    tracing::info!(user_id = %saved.id, "👤 user synced");
    Ok(Json(json!({ "success": true, "user": saved })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TripStore;
    use crate::test_support::{app_with_store, authed, post_json, send, token_for};
    use axum::http::StatusCode;

    #[test]
    fn token_round_trips_with_shared_secret() {
        let claims = verify_token(&token_for("asha@example.com"), "test-secret").unwrap();
        assert_eq!(claims.email, "asha@example.com");
        assert_eq!(claims.name.as_deref(), Some("Test Traveller"));
    }

    #[test]
    fn token_with_other_secret_rejected() {
        assert!(verify_token(&token_for("asha@example.com"), "another-secret").is_err());
    }

    #[tokio::test]
    async fn sync_requires_token() {
        let (app, _) = app_with_store("http://127.0.0.1:9");
        let (status, body) = send(app, post_json("/api/users/sync", json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"success": false, "error": "Unauthorized"}));
    }

    #[tokio::test]
    async fn sync_is_idempotent() {
        let (app, store) = app_with_store("http://127.0.0.1:9");

        let (status, first) = send(
            app.clone(),
            authed(post_json("/api/users/sync", json!({})), "asha@example.com"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["user"]["email"], "asha@example.com");

        let (_, second) = send(app, authed(post_json("/api/users/sync", json!({})), "asha@example.com")).await;
        assert_eq!(first["user"]["id"], second["user"]["id"]);
        assert!(store.find_user_id("asha@example.com").await.unwrap().is_some());
    }
}
