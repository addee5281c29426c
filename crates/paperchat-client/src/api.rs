//! HTTP client for the document service REST API.
//!
//! Implements the `paperchat-core` collaborator traits over reqwest. The
//! server speaks FastAPI conventions: JSON bodies, bearer authorization,
//! and error payloads of the form `{"detail": "..."}`.

use async_trait::async_trait;
use paperchat_core::session::{AnswerService, ChatMessage, ExtractionService, MessageRole, TranscriptStore};
use paperchat_core::{ChatError, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::credential::Credential;

/// Number of retrieved chunks the answer endpoint considers per question.
const DEFAULT_N_RESULTS: u32 = 5;

/// Client for the remote document service.
///
/// One instance serves all endpoints; the session layer sees it through
/// three narrow traits. The bearer credential is shared, so a login through
/// this client is visible to every call that follows.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credential: Credential,
}

impl ApiClient {
    /// Creates a client from connection settings and a credential.
    pub fn new(config: &ClientConfig, credential: Credential) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    /// Returns the credential handle used by this client.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the bearer token when one is installed.
    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.credential.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Maps a response to `T`, converting non-success statuses into
    /// structured API errors carrying the server's detail string.
    async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(status, response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ChatError::transport(format!("Failed to parse response: {e}")))
    }

    /// Like [`Self::parse`], for endpoints whose body we discard.
    async fn expect_success(response: Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(status, response).await);
        }
        Ok(())
    }

    async fn error_from(status: StatusCode, response: Response) -> ChatError {
        let detail = match response.text().await {
            Ok(body) => serde_json::from_str::<DetailResponse>(&body)
                .ok()
                .map(|wrapper| wrapper.detail),
            Err(_) => None,
        };
        ChatError::api(Some(status.as_u16()), detail)
    }

    /// Exchanges credentials for a bearer token and installs it.
    ///
    /// The `/token` endpoint is OAuth2-password-flow shaped and expects a
    /// form-encoded body.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| ChatError::transport(format!("Login request failed: {e}")))?;
        let token: TokenResponse = Self::parse(response).await?;
        self.credential.set(&token.access_token);
        Ok(token.access_token)
    }

    /// Lists the documents the user has uploaded.
    pub async fn my_uploads(&self) -> Result<Vec<UploadEntry>> {
        let response = self
            .authed(self.http.get(self.url("/pdf/my_uploads")))
            .send()
            .await
            .map_err(|e| ChatError::transport(format!("Upload listing failed: {e}")))?;
        Self::parse(response).await
    }

    /// Deletes the stored transcript for a document.
    ///
    /// Never called by the session orchestrator (history is append-only
    /// from its point of view) but exposed for an explicit reset.
    pub async fn clear_history(&self, document_id: &str) -> Result<()> {
        let response = self
            .authed(
                self.http
                    .delete(self.url(&format!("/pdf/chat/history/{document_id}"))),
            )
            .send()
            .await
            .map_err(|e| ChatError::store_unavailable(format!("History clear failed: {e}")))?;
        Self::expect_success(response).await
    }
}

#[async_trait]
impl TranscriptStore for ApiClient {
    async fn fetch_history(&self, document_id: &str) -> Result<Vec<ChatMessage>> {
        let response = self
            .authed(
                self.http
                    .get(self.url(&format!("/pdf/chat/history/{document_id}"))),
            )
            .send()
            .await
            .map_err(|e| ChatError::store_unavailable(format!("History fetch failed: {e}")))?;
        let history: HistoryResponse = Self::parse(response)
            .await
            .map_err(|e| ChatError::store_unavailable(e.to_string()))?;
        Ok(history.messages.into_iter().map(WireMessage::into_message).collect())
    }

    async fn append_message(
        &self,
        document_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<()> {
        let body = SaveMessageRequest {
            metadata_id: document_id,
            role,
            content,
        };
        let response = self
            .authed(self.http.post(self.url("/pdf/chat/save")))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::store_unavailable(format!("Message save failed: {e}")))?;
        Self::expect_success(response)
            .await
            .map_err(|e| ChatError::store_unavailable(e.to_string()))
    }
}

#[async_trait]
impl ExtractionService for ApiClient {
    async fn extract(&self, document_id: &str) -> Result<()> {
        let response = self
            .authed(
                self.http
                    .get(self.url(&format!("/pdf/extract_chunks/{document_id}"))),
            )
            .send()
            .await
            .map_err(|e| ChatError::transport(format!("Extraction request failed: {e}")))?;
        // Success/failure is all the session consumes.
        Self::expect_success(response).await
    }
}

#[async_trait]
impl AnswerService for ApiClient {
    async fn ask(&self, document_id: &str, question: &str, context: &str) -> Result<String> {
        let body = AskRequest {
            metadata_id: document_id,
            query: question,
            conversation_history: context,
            n_results: DEFAULT_N_RESULTS,
        };
        let response = self
            .authed(self.http.post(self.url("/pdf/ask")))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::transport(format!("Answer request failed: {e}")))?;
        let answer: AskResponse = Self::parse(response).await?;
        Ok(answer.answer)
    }
}

/// One entry from the upload listing.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadEntry {
    /// Identifier used by every chat endpoint.
    pub metadata_id: String,
    /// Original filename, shown as the document's display name.
    pub filename: String,
    /// Upload timestamp, when the server provides one.
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[derive(Deserialize)]
struct WireMessage {
    role: MessageRole,
    content: String,
    #[serde(default)]
    timestamp: Option<String>,
}

impl WireMessage {
    fn into_message(self) -> ChatMessage {
        let mut message = ChatMessage::new(self.role, self.content);
        if let Some(timestamp) = self.timestamp {
            message.timestamp = timestamp;
        }
        message
    }
}

#[derive(Serialize)]
struct SaveMessageRequest<'a> {
    metadata_id: &'a str,
    role: MessageRole,
    content: &'a str,
}

#[derive(Serialize)]
struct AskRequest<'a> {
    metadata_id: &'a str,
    query: &'a str,
    conversation_history: &'a str,
    n_results: u32,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
}

#[derive(Deserialize)]
struct DetailResponse {
    detail: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}
