//! Context window rendering for follow-up questions.
//!
//! Follow-up questions routinely lean on pronouns and implicit references
//! ("what about its limitations?"). The answer service receives a bounded
//! textual rendering of recent turns alongside each new question so those
//! references resolve.

use super::message::ChatMessage;

/// Number of trailing messages included in a context window (3 exchanges).
pub const CONTEXT_WINDOW_MESSAGES: usize = 6;

/// Renders the trailing portion of a transcript into context text.
///
/// Takes the last [`CONTEXT_WINDOW_MESSAGES`] messages in transcript order
/// (all of them when fewer exist), renders each as `"<Role>: <content>"`,
/// and joins them with a blank line.
///
/// This is a fixed-size sliding window, not a token-budget-aware
/// truncation: it bounds request size deterministically at the cost of
/// occasionally dropping older relevant context.
pub fn build_context_window(messages: &[ChatMessage]) -> String {
    let start = messages.len().saturating_sub(CONTEXT_WINDOW_MESSAGES);
    messages[start..]
        .iter()
        .map(|msg| format!("{}: {}", msg.role.label(), msg.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
