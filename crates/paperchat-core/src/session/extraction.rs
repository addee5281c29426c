//! Extraction gate state machine.
//!
//! A document must be extracted (chunked and indexed server-side) before it
//! can answer questions. The gate guarantees extraction is triggered at most
//! once per session and that no question is answerable before it succeeds.

use serde::{Deserialize, Serialize};

/// Extraction progress for the session's document.
///
/// Transitions: `NotStarted → InProgress → Ready` or
/// `NotStarted → InProgress → Failed`. `Ready` and `Failed` are terminal
/// within a session; a failed extraction is not retried; the user starts a
/// new session instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionState {
    /// Extraction has not been attempted yet.
    NotStarted,
    /// The extraction call is in flight.
    InProgress,
    /// The document is indexed and questions are allowed.
    Ready,
    /// Extraction failed; the session stays readable but not queryable.
    Failed,
}

/// Drives the [`ExtractionState`] transitions for one session.
///
/// The gate is the only component that mutates extraction state. All
/// transition methods are conditional and return whether the transition
/// actually happened, so callers get idempotency for free.
#[derive(Debug, Clone, Default)]
pub struct ExtractionGate {
    state: ExtractionState,
}

impl Default for ExtractionState {
    fn default() -> Self {
        ExtractionState::NotStarted
    }
}

impl ExtractionGate {
    /// Creates a gate in the `NotStarted` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn state(&self) -> ExtractionState {
        self.state
    }

    /// True iff the gate has reached `Ready`.
    pub fn is_ready(&self) -> bool {
        self.state == ExtractionState::Ready
    }

    /// True once the gate has left `NotStarted`.
    pub fn has_started(&self) -> bool {
        self.state != ExtractionState::NotStarted
    }

    /// Moves to `InProgress`, but only from `NotStarted`.
    ///
    /// Returns `true` if this call won the transition. A second caller while
    /// extraction is in flight (or finished) gets `false` and must not issue
    /// another extraction request.
    pub fn begin(&mut self) -> bool {
        if self.state == ExtractionState::NotStarted {
            self.state = ExtractionState::InProgress;
            true
        } else {
            false
        }
    }

    /// Marks the gate `Ready` directly from `NotStarted`.
    ///
    /// Used when loaded history is non-empty: history presence is treated as
    /// proof of a prior successful extraction, so no extraction call is
    /// made. This is an inferred invariant: the server is not asked to
    /// confirm it. Returns `true` if the transition happened.
    pub fn satisfy_from_history(&mut self) -> bool {
        if self.state == ExtractionState::NotStarted {
            self.state = ExtractionState::Ready;
            true
        } else {
            false
        }
    }

    /// Completes an in-flight extraction successfully.
    pub fn mark_ready(&mut self) -> bool {
        if self.state == ExtractionState::InProgress {
            self.state = ExtractionState::Ready;
            true
        } else {
            false
        }
    }

    /// Fails an in-flight extraction. Terminal for this session.
    pub fn mark_failed(&mut self) -> bool {
        if self.state == ExtractionState::InProgress {
            self.state = ExtractionState::Failed;
            true
        } else {
            false
        }
    }
}
