//! Session domain module.
//!
//! This module contains everything scoped to one open document
//! conversation: the message transcript, the extraction gate state machine,
//! the context window builder, the collaborator traits, and the session
//! orchestrator that ties them together.
//!
//! # Module Structure
//!
//! - `message`: transcript message types (`MessageRole`, `ChatMessage`)
//! - `extraction`: extraction gate state machine (`ExtractionState`, `ExtractionGate`)
//! - `context`: bounded context window rendering for follow-up questions
//! - `event`: state transition events emitted by the orchestrator
//! - `service`: traits for the remote collaborators the session depends on
//! - `orchestrator`: session lifecycle and submit sequencing (`ChatSession`)

mod context;
mod event;
mod extraction;
mod message;
mod orchestrator;
mod service;

// Re-export public API
pub use context::{CONTEXT_WINDOW_MESSAGES, build_context_window};
pub use event::SessionEvent;
pub use extraction::{ExtractionGate, ExtractionState};
pub use message::{ChatMessage, MessageRole};
pub use orchestrator::{ChatSession, EXTRACTION_FAILED_MESSAGE, GENERIC_ANSWER_FAILURE};
pub use service::{AnswerService, ExtractionService, TranscriptStore};
