#![doc = "Notion API client: implements the core `TablePublisher` contract over HTTPS."]
//
//! # Notion client (CLI <-> Core)
//!
//! This module wires the [`TablePublisher`] trait from `publish-table-core` to the real
//! Notion REST API. It is the only place in the workspace that speaks HTTP.
//!
//! - Construct a [`NotionClient`] from the loaded [`NotionSettings`] (API key, base URL).
//! - Every request is bearer-authenticated and pinned to [`NOTION_VERSION`].
//! - Non-success responses are mapped to [`ApiError::Status`] using Notion's error
//!   `message` when the body has one, so failed rows carry a readable reason.
//!
//! The base URL is configurable so tests can point the client at a mock server.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use publish_table_core::config::NotionSettings;
use publish_table_core::contract::{ApiError, CreatedRow, RemoteDatabase, TablePublisher};
use publish_table_core::schema::{CreateDatabaseRequest, CreatePageRequest};

/// API version header sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

#[derive(Deserialize)]
struct NotionErrorBody {
    message: String,
}

pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl NotionClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        let api_key: String = api_key.into();
        tracing::info!(
            api_key_set = !api_key.is_empty(),
            base_url = %base_url,
            "Initialized NotionClient"
        );
        NotionClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: SecretString::from(api_key),
        }
    }

    pub fn from_settings(settings: &NotionSettings) -> Self {
        Self::new(settings.api_key.clone(), settings.base_url.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(self.api_key.expose_secret())
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "Request to Notion failed");
            ApiError::Transport(e.to_string())
        })
    }
}

/// Turn a non-success response into an [`ApiError::Status`].
async fn status_error(resp: Response) -> ApiError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<NotionErrorBody>(&body) {
        Ok(err) => err.message,
        Err(_) if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body,
    };
    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let body = resp
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))
}

#[async_trait]
impl TablePublisher for NotionClient {
    async fn fetch_page(&self, page_id: &str) -> Result<serde_json::Value, ApiError> {
        tracing::info!(page_id, "Fetching Notion page");
        let resp = self
            .send(self.request(Method::GET, &format!("/v1/pages/{page_id}")))
            .await?;
        if resp.status() != StatusCode::OK {
            let err = status_error(resp).await;
            tracing::error!(error = %err, page_id, "Page lookup returned non-200");
            return Err(err);
        }
        read_json(resp).await
    }

    async fn create_database(
        &self,
        req: &CreateDatabaseRequest,
    ) -> Result<RemoteDatabase, ApiError> {
        tracing::info!(
            page_id = %req.parent.page_id,
            title = %req.title_text(),
            "Creating Notion database"
        );
        let resp = self
            .send(self.request(Method::POST, "/v1/databases").json(req))
            .await?;
        if !resp.status().is_success() {
            let err = status_error(resp).await;
            tracing::error!(error = %err, "API error creating database");
            return Err(err);
        }
        let database: RemoteDatabase = read_json(resp).await?;
        tracing::info!(database_id = %database.id, "Successfully created database");
        Ok(database)
    }

    async fn create_row(&self, req: &CreatePageRequest) -> Result<CreatedRow, ApiError> {
        tracing::debug!(
            database_id = %req.parent.database_id,
            name = %req.row_name(),
            "Creating Notion page in database"
        );
        let resp = self
            .send(self.request(Method::POST, "/v1/pages").json(req))
            .await?;
        if !resp.status().is_success() {
            let err = status_error(resp).await;
            tracing::error!(error = %err, name = %req.row_name(), "API error creating page");
            return Err(err);
        }
        // The row exists once Notion answered 2xx, whatever the body says.
        let body = resp.text().await.unwrap_or_default();
        let row = serde_json::from_str::<CreatedRow>(&body).unwrap_or_else(|e| {
            tracing::warn!(error = %e, name = %req.row_name(), "Unexpected body for created page");
            CreatedRow::default()
        });
        Ok(row)
    }
}
