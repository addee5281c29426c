use serde::{Deserialize, Serialize};

use super::extraction::ExtractionState;
use super::message::ChatMessage;

/// State transition events emitted by a session.
///
/// The presentation layer consumes these through a broadcast subscription
/// and renders purely from them plus the session's observable state; it
/// holds no business rules of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The extraction gate changed state.
    ExtractionChanged { state: ExtractionState },
    /// A message was appended to the transcript.
    MessageAppended { message: ChatMessage },
    /// A submit request went in flight (busy indicator on).
    RequestStarted,
    /// The in-flight submit resolved (busy indicator off).
    RequestFinished,
    /// The session was torn down; late events should be ignored.
    Closed,
}
