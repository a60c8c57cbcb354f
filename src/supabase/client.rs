// SPDX-License-Identifier: MPL-2.0

use crate::config;
use crate::supabase::types::{FeedMode, Memory, MemoryRow, NewMemory, Profile, Session};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("missing configuration: {0}")]
    Config(String),
}

/// Time-based object key for an uploaded photo, `<unix-millis>.<ext>`.
pub fn media_object_key(file_name: &str, unix_millis: i64) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && !ext.contains('/'))
        .unwrap_or_else(|| "bin".to_string());
    format!("{unix_millis}.{ext}")
}

/// Query string for the memory feed: the profile and like-count joins always,
/// the ownership filter only in `Mine` mode.
fn memories_query(feed_mode: FeedMode, user_id: &str) -> Vec<(String, String)> {
    let mut query = vec![(
        "select".to_string(),
        "*,profiles(username),likes(count)".to_string(),
    )];
    if feed_mode.is_mine() {
        query.push(("user_id".to_string(), format!("eq.{user_id}")));
    }
    query
}

/// Pull a human-readable message out of a GoTrue/PostgREST error body.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    format!("{status}")
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LikeRow {
    memory_id: i64,
}

/// Thin REST client for the hosted backend (auth, relational store, object
/// storage). The rest of the app only sees our own types.
pub struct ChronoClient {
    http: reqwest::Client,
    base: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
}

impl ChronoClient {
    pub fn from_env() -> Result<Self, ClientError> {
        let base = config::backend_url()
            .ok_or_else(|| ClientError::Config("CHRONOMAP_BACKEND_URL is not set".into()))?;
        let anon_key = config::backend_key()
            .ok_or_else(|| ClientError::Config("CHRONOMAP_BACKEND_KEY is not set".into()))?;
        Ok(Self::new(&base, &anon_key))
    }

    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().unwrap().clone()
    }

    pub fn clear_session(&self) {
        *self.session.write().unwrap() = None;
    }

    fn set_session(&self, session: Session) {
        *self.session.write().unwrap() = Some(session);
    }

    /// Bearer token for authenticated calls: the session access token, or the
    /// anon key before sign-in (sign-up and its profile insert need this).
    fn bearer(&self) -> String {
        self.session
            .read()
            .unwrap()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn current_user_id(&self) -> Result<String, ClientError> {
        self.session
            .read()
            .unwrap()
            .as_ref()
            .map(|s| s.user_id.clone())
            .ok_or(ClientError::NotAuthenticated)
    }

    // --- auth ---

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(ClientError::Auth(error_message(status, &body)));
        }

        let tokens: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let session = Session {
            user_id: tokens.user.id,
            email: tokens.user.email.unwrap_or_else(|| email.to_string()),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        };
        self.set_session(session.clone());
        Ok(session)
    }

    /// Exchange a stored refresh token for a fresh session on startup.
    pub async fn resume(&self, refresh_token: &str) -> Result<Session, ClientError> {
        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.base);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(ClientError::Auth(error_message(status, &body)));
        }

        let tokens: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let session = Session {
            email: tokens.user.email.unwrap_or_default(),
            user_id: tokens.user.id,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        };
        self.set_session(session.clone());
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, ClientError> {
        let url = format!("{}/auth/v1/signup", self.base);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(ClientError::Auth(error_message(status, &body)));
        }

        // With email confirmation off the endpoint returns a full token
        // response; with it on, just the user object.
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let user_value = value.get("user").cloned().unwrap_or(value);
        serde_json::from_value(user_value).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Create the public profile row right after sign-up.
    pub async fn create_profile(&self, profile: &Profile) -> Result<(), ClientError> {
        let url = format!("{}/rest/v1/profiles", self.base);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .header("Prefer", "return=minimal")
            .json(&json!([{
                "id": profile.id,
                "username": profile.username,
                "is_private": profile.is_private,
            }]))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Query(error_message(status, &body)));
        }
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let token = match self.session() {
            Some(s) => s.access_token,
            None => return Ok(()),
        };
        let url = format!("{}/auth/v1/logout", self.base);
        let result = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await;
        // Local sign-out wins even when the server call fails.
        self.clear_session();
        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(ClientError::Network(e.to_string())),
        }
    }

    // --- relational store ---

    /// Read the feed, joined with profiles (author name) and the like count,
    /// plus the viewer's own like rows for the `viewer_liked` annotation.
    pub async fn fetch_memories(&self, feed_mode: FeedMode) -> Result<Vec<Memory>, ClientError> {
        let user_id = self.current_user_id()?;
        let url = format!("{}/rest/v1/memories", self.base);
        let response = self
            .http
            .get(&url)
            .query(&memories_query(feed_mode, &user_id))
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(ClientError::Query(error_message(status, &body)));
        }

        let rows: Vec<MemoryRow> = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let liked = self.fetch_viewer_likes(&user_id).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let viewer_liked = liked.contains(&row.id);
                row.annotate(viewer_liked)
            })
            .collect())
    }

    async fn fetch_viewer_likes(&self, user_id: &str) -> Result<HashSet<i64>, ClientError> {
        let url = format!("{}/rest/v1/likes", self.base);
        let owner_filter = format!("eq.{user_id}");
        let response = self
            .http
            .get(&url)
            .query(&[("select", "memory_id"), ("user_id", owner_filter.as_str())])
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(ClientError::Query(error_message(status, &body)));
        }

        let rows: Vec<LikeRow> = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.memory_id).collect())
    }

    pub async fn insert_like(&self, memory_id: i64) -> Result<(), ClientError> {
        let user_id = self.current_user_id()?;
        let url = format!("{}/rest/v1/likes", self.base);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .header("Prefer", "return=minimal")
            .json(&json!([{ "user_id": user_id, "memory_id": memory_id }]))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Query(error_message(status, &body)));
        }
        Ok(())
    }

    /// Insert a memory row and return it as stored (id assigned, joins empty).
    pub async fn insert_memory(&self, draft: &NewMemory) -> Result<Memory, ClientError> {
        let user_id = self.current_user_id()?;
        let year = draft
            .year()
            .ok_or_else(|| ClientError::Query(format!("invalid date: {}", draft.date)))?;

        let url = format!("{}/rest/v1/memories", self.base);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .header("Prefer", "return=representation")
            .json(&json!([{
                "user_id": user_id,
                "title": draft.title,
                "description": draft.description,
                "date": draft.date,
                "year": year,
                "location_lat": draft.lat,
                "location_lng": draft.lng,
                "media_url": draft.media_url,
            }]))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(ClientError::Query(error_message(status, &body)));
        }

        let mut rows: Vec<MemoryRow> = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        if rows.is_empty() {
            return Err(ClientError::InvalidResponse(
                "insert returned no rows".into(),
            ));
        }
        Ok(rows.remove(0).annotate(false))
    }

    // --- object storage ---

    /// Store a photo and return its stable public address.
    pub async fn upload_media(
        &self,
        key: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<String, ClientError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base,
            config::MEDIA_BUCKET,
            key
        );
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .header("Content-Type", mime.to_string())
            .body(bytes)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Upload(error_message(status, &body)));
        }
        Ok(self.public_media_url(key))
    }

    pub fn public_media_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base,
            config::MEDIA_BUCKET,
            key
        )
    }

    /// Compensating delete for an upload whose memory insert failed.
    pub async fn remove_media(&self, key: &str) -> Result<(), ClientError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base,
            config::MEDIA_BUCKET,
            key
        );
        let response = self
            .http
            .delete(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Upload(error_message(status, &body)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mine_query_filters_by_owner() {
        let query = memories_query(FeedMode::Mine, "u1");
        assert!(
            query
                .iter()
                .any(|(k, v)| k == "user_id" && v == "eq.u1")
        );
    }

    #[test]
    fn test_explore_query_has_no_owner_filter() {
        let query = memories_query(FeedMode::Explore, "u1");
        assert!(query.iter().all(|(k, _)| k != "user_id"));
    }

    #[test]
    fn test_feed_query_always_joins() {
        for mode in [FeedMode::Mine, FeedMode::Explore] {
            let query = memories_query(mode, "u1");
            let select = &query.iter().find(|(k, _)| k == "select").unwrap().1;
            assert!(select.contains("profiles(username)"));
            assert!(select.contains("likes(count)"));
        }
    }

    #[test]
    fn test_media_object_key_is_time_based() {
        assert_eq!(media_object_key("holiday.JPG", 1700000000123), "1700000000123.jpg");
        assert_eq!(media_object_key("noext", 42), "42.bin");
        assert_eq!(media_object_key("trailing.", 42), "42.bin");
    }

    #[test]
    fn test_error_message_prefers_backend_text() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(
            error_message(status, r#"{"error_description":"bad creds"}"#),
            "bad creds"
        );
        assert_eq!(error_message(status, r#"{"message":"row violates RLS"}"#), "row violates RLS");
        assert_eq!(error_message(status, "not json"), "400 Bad Request");
    }

    #[test]
    fn test_public_media_url_shape() {
        let client = ChronoClient::new("https://example.supabase.co/", "anon");
        assert_eq!(
            client.public_media_url("17.jpg"),
            "https://example.supabase.co/storage/v1/object/public/memories/17.jpg"
        );
    }
}
