//! Supabase (`PostgREST`) implementation of the remote gateway.
//!
//! Each collection lives in its own table with one row per user:
//! `user_id` (primary key), `data` (jsonb) and `updated_at`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{GatewayError, GatewayResult, RemoteGateway};
use crate::config::RemoteConfig;
use crate::models::Collection;
use crate::util::compact_text;

const HTTP_TIMEOUT_SECS: u64 = 15;
/// `PostgREST`: column not found in the schema cache.
const PGRST_UNKNOWN_COLUMN: &str = "PGRST204";
/// Postgres `undefined_column`.
const PG_UNDEFINED_COLUMN: &str = "42703";

#[derive(Clone)]
pub struct SupabaseGateway {
    rest_url: String,
    anon_key: String,
    access_token: Option<String>,
    client: Client,
}

impl fmt::Debug for SupabaseGateway {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SupabaseGateway")
            .field("rest_url", &self.rest_url)
            .field("anon_key", &self.anon_key)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl SupabaseGateway {
    pub fn new(config: &RemoteConfig) -> GatewayResult<Self> {
        if config.anon_key.trim().is_empty() {
            return Err(GatewayError::InvalidConfiguration(
                "anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            rest_url: config.rest_url(),
            anon_key: config.anon_key.clone(),
            access_token: None,
            client: Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?,
        })
    }

    /// Attach the signed-in user's access token (row-level security).
    #[must_use]
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.set_access_token(access_token);
        self
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        let token = access_token.into().trim().to_string();
        self.access_token = (!token.is_empty()).then_some(token);
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.rest_url, collection.remote_table())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .header(reqwest::header::ACCEPT, "application/json")
    }
}

#[derive(Debug, Deserialize)]
struct RemoteRow {
    #[serde(default)]
    data: Value,
}

#[async_trait]
impl RemoteGateway for SupabaseGateway {
    async fn pull(&self, user_id: &str, collection: Collection) -> GatewayResult<Option<Value>> {
        let filter = format!("eq.{user_id}");
        let request = self.authorized(
            self.client
                .get(self.table_url(collection))
                .query(&[("select", "data"), ("user_id", filter.as_str())]),
        );
        let response = ensure_success(request.send().await?).await?;
        let rows = response.json::<Vec<RemoteRow>>().await?;

        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.data)
            .filter(|data| !data.is_null()))
    }

    async fn push(
        &self,
        user_id: &str,
        collection: Collection,
        payload: &Value,
    ) -> GatewayResult<()> {
        let body = serde_json::json!([{
            "user_id": user_id,
            "data": payload,
            "updated_at": chrono::Utc::now().to_rfc3339(),
        }]);
        let request = self.authorized(
            self.client
                .post(self.table_url(collection))
                .query(&[("on_conflict", "user_id")])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(&body),
        );
        ensure_success(request.send().await?).await?;
        tracing::debug!("Pushed {collection} for user {user_id}");
        Ok(())
    }
}

async fn ensure_success(response: Response) -> GatewayResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(classify_api_error(status, &body))
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

fn classify_api_error(status: StatusCode, body: &str) -> GatewayError {
    let parsed = serde_json::from_str::<PostgrestErrorBody>(body).ok();
    let code = parsed.as_ref().and_then(|payload| payload.code.clone());
    let message = parsed
        .and_then(|payload| payload.message.or(payload.error))
        .map(|message| compact_text(&message))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            let trimmed = compact_text(body);
            if trimmed.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                trimmed
            }
        });

    if matches!(
        code.as_deref(),
        Some(PGRST_UNKNOWN_COLUMN | PG_UNDEFINED_COLUMN)
    ) {
        return GatewayError::UnknownField(message);
    }

    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        return GatewayError::Unavailable(format!("{message} ({})", status.as_u16()));
    }

    GatewayError::Api {
        status: status.as_u16(),
        message,
    }
}
