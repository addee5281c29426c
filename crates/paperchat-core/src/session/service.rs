//! Collaborator traits the session depends on.
//!
//! These traits define the contract between the session orchestrator and
//! the remote document service, decoupling the core logic from the specific
//! transport (HTTP in production, in-memory mocks in tests).

use super::message::{ChatMessage, MessageRole};
use crate::error::Result;
use async_trait::async_trait;

/// Remote persistence of chat messages, keyed by document identifier.
///
/// The store is append-only from the session's perspective: messages are
/// never edited or removed once appended. The in-memory transcript is the
/// working copy; the store is the durable copy of record.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Fetches the stored transcript for a document.
    ///
    /// # Returns
    ///
    /// - `Ok(vec![])`: no history exists yet
    /// - `Ok(messages)`: prior transcript in insertion order
    /// - `Err(StoreUnavailable)`: transport error
    async fn fetch_history(&self, document_id: &str) -> Result<Vec<ChatMessage>>;

    /// Appends one message to the stored transcript.
    ///
    /// Failures are non-fatal to the session: the orchestrator logs and
    /// continues, so a degraded durability path never stalls the chat.
    async fn append_message(
        &self,
        document_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<()>;
}

/// Server-side extraction step that makes a document queryable.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Triggers extraction for a document. Success/failure only; the core
    /// consumes no payload beyond the outcome.
    async fn extract(&self, document_id: &str) -> Result<()>;
}

/// The question-answering service.
#[async_trait]
pub trait AnswerService: Send + Sync {
    /// Asks a question against a document, with recent-turn context text.
    ///
    /// # Returns
    ///
    /// - `Ok(answer)`: the generated answer
    /// - `Err(Api { detail, .. })`: service failure, optionally carrying a
    ///   human-readable detail string
    async fn ask(&self, document_id: &str, question: &str, context: &str) -> Result<String>;
}
