//! Message store backed by a Supabase project, spoken to through its
//! PostgREST endpoint.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Response,
};
use serde::Deserialize;
use serde_json::Value;
use shared::api::message::CreateRequest;

use super::{MessageStore, StoreError, MESSAGES_TABLE};

pub struct SupabaseStore {
    client: reqwest::Client,
    table_url: String,
}

/// Error body PostgREST sends with every non-2xx answer.
#[derive(Deserialize)]
struct PostgrestError {
    message: String,
}

impl SupabaseStore {
    pub fn new(url: &str, key: &str) -> anyhow::Result<Self> {
        let mut api_key = HeaderValue::from_str(key).context("SUPABASE_KEY is not a valid header value")?;
        api_key.set_sensitive(true);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", api_key);
        headers.insert(header::AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(SupabaseStore {
            client,
            table_url: format!("{}/rest/v1/{}", url.trim_end_matches('/'), MESSAGES_TABLE),
        })
    }
}

#[async_trait]
impl MessageStore for SupabaseStore {
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Value>, StoreError> {
        tracing::debug!(chat_id, "listing messages");

        let response = self
            .client
            .get(&self.table_url)
            .query(&[
                ("select", "*".to_string()),
                ("chat_id", format!("eq.{chat_id}")),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn insert_message(&self, message: CreateRequest) -> Result<Vec<Value>, StoreError> {
        tracing::debug!(?message, "inserting message");

        let response = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(&[&message])
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;

    let message = match serde_json::from_str::<PostgrestError>(&body) {
        Ok(err) => err.message,
        Err(_) if !body.trim().is_empty() => body,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };

    tracing::debug!(status = status.as_u16(), %message, "postgrest rejected request");

    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}
