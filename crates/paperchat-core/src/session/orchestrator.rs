//! Session orchestration for one open document conversation.
//!
//! `ChatSession` owns the transcript, drives the extraction gate, sequences
//! submit/response/persist operations and implements the failure policy at
//! every network boundary. All collaborators are reached through the traits
//! in [`super::service`], so the orchestrator itself never touches a socket.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{RwLock, broadcast};

use super::context::build_context_window;
use super::event::SessionEvent;
use super::extraction::{ExtractionGate, ExtractionState};
use super::message::{ChatMessage, MessageRole};
use super::service::{AnswerService, ExtractionService, TranscriptStore};

/// Message shown when extraction fails. Terminal for the session.
pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Failed to process the document. Please try again later.";

/// Fallback shown when the answer service fails without a detail string.
pub const GENERIC_ANSWER_FAILURE: &str = "Sorry, I encountered an error. Please try again.";

fn welcome_message(display_name: &str) -> String {
    format!(
        "Document '{display_name}' has been processed and is ready for questions! \
         You can now ask me anything about this document."
    )
}

/// Client-side state for one document conversation.
///
/// A session is created when the user opens a document's chat and torn down
/// with [`ChatSession::close`] when they leave; nothing survives teardown
/// except what the transcript store persisted. Within a session the
/// transcript is append-only and exclusively owned here; no other
/// component writes to it.
///
/// Concurrency model: at most one submit is in flight per session; a second
/// submit while one is pending is a no-op, mirroring a disabled input
/// affordance. Teardown bumps an epoch counter so responses resolving after
/// [`ChatSession::close`] are discarded instead of mutating dead state.
pub struct ChatSession {
    /// Identifier of the document this session converses with
    document_id: String,
    /// Human-readable document name, used in the welcome message
    display_name: String,
    /// Ordered, append-only message transcript
    transcript: Arc<RwLock<Vec<ChatMessage>>>,
    /// Extraction gate; sole owner of extraction state transitions
    gate: Arc<RwLock<ExtractionGate>>,
    /// True while a submit is in flight
    pending: Arc<AtomicBool>,
    /// Bumped on close; in-flight operations re-check it before mutating
    epoch: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
    store: Arc<dyn TranscriptStore>,
    extractor: Arc<dyn ExtractionService>,
    answerer: Arc<dyn AnswerService>,
    events: broadcast::Sender<SessionEvent>,
}

impl ChatSession {
    /// Creates a session for one document.
    ///
    /// # Arguments
    ///
    /// * `document_id` - Identifier the remote services key on
    /// * `display_name` - Document name shown in the welcome message
    /// * `store` - Transcript persistence collaborator
    /// * `extractor` - Extraction trigger collaborator
    /// * `answerer` - Question-answering collaborator
    pub fn new(
        document_id: impl Into<String>,
        display_name: impl Into<String>,
        store: Arc<dyn TranscriptStore>,
        extractor: Arc<dyn ExtractionService>,
        answerer: Arc<dyn AnswerService>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            document_id: document_id.into(),
            display_name: display_name.into(),
            transcript: Arc::new(RwLock::new(Vec::new())),
            gate: Arc::new(RwLock::new(ExtractionGate::new())),
            pending: Arc::new(AtomicBool::new(false)),
            epoch: Arc::new(AtomicU64::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
            store,
            extractor,
            answerer,
            events,
        }
    }

    /// Subscribes to state transition events.
    ///
    /// The presentation layer renders from these; missing a lagged event is
    /// recoverable by re-reading [`ChatSession::transcript`].
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Returns the document identifier this session is scoped to.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Returns a snapshot of the transcript in insertion order.
    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.read().await.clone()
    }

    /// Returns the current extraction state.
    pub async fn extraction_state(&self) -> ExtractionState {
        self.gate.read().await.state()
    }

    /// True while a submit is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// True iff the gate is `Ready` and no request is pending.
    pub async fn submit_allowed(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
            && self.gate.read().await.is_ready()
            && !self.is_pending()
    }

    /// Starts the session: loads history, then gates extraction.
    ///
    /// Non-empty history sets the transcript and satisfies the gate without
    /// an extraction call; history presence is treated as proof of prior
    /// successful extraction. A failed history load is logged and the
    /// session proceeds on an empty transcript.
    ///
    /// Calling `start` again once the gate has left `NotStarted` is a no-op;
    /// extraction is triggered at most once per session.
    pub async fn start(&self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let epoch = self.epoch.load(Ordering::SeqCst);
        if self.gate.read().await.has_started() {
            return;
        }

        match self.store.fetch_history(&self.document_id).await {
            Ok(history) if !history.is_empty() => {
                if self.stale(epoch) {
                    return;
                }
                if !self.gate.write().await.satisfy_from_history() {
                    // A concurrent start won the gate while we were fetching.
                    return;
                }
                *self.transcript.write().await = history;
                self.emit(SessionEvent::ExtractionChanged {
                    state: ExtractionState::Ready,
                });
                return;
            }
            Ok(_) => {}
            Err(err) => {
                // Availability over consistency: a degraded history load
                // never blocks the session.
                tracing::warn!(
                    document_id = %self.document_id,
                    error = %err,
                    "failed to load chat history, continuing without it"
                );
            }
        }

        if self.stale(epoch) {
            return;
        }
        if !self.gate.write().await.begin() {
            return;
        }
        self.emit(SessionEvent::ExtractionChanged {
            state: ExtractionState::InProgress,
        });

        match self.extractor.extract(&self.document_id).await {
            Ok(()) => {
                if self.stale(epoch) {
                    return;
                }
                self.gate.write().await.mark_ready();
                self.emit(SessionEvent::ExtractionChanged {
                    state: ExtractionState::Ready,
                });
                let welcome = welcome_message(&self.display_name);
                self.append_local(ChatMessage::assistant(&welcome)).await;
                self.persist(MessageRole::Assistant, &welcome).await;
            }
            Err(err) => {
                if self.stale(epoch) {
                    return;
                }
                tracing::warn!(
                    document_id = %self.document_id,
                    error = %err,
                    "document extraction failed"
                );
                self.gate.write().await.mark_failed();
                self.emit(SessionEvent::ExtractionChanged {
                    state: ExtractionState::Failed,
                });
                // Shown regardless of whether the persist below succeeds.
                self.append_local(ChatMessage::assistant(EXTRACTION_FAILED_MESSAGE))
                    .await;
                self.persist(MessageRole::Assistant, EXTRACTION_FAILED_MESSAGE)
                    .await;
            }
        }
    }

    /// Submits a question.
    ///
    /// No-op unless [`ChatSession::submit_allowed`] holds and the question
    /// is non-blank; the UI disables its submit control under the same
    /// conditions, so a rejected call is silence, not an error.
    ///
    /// The user message is appended optimistically and persisted before the
    /// answer call; persistence failures are logged and swallowed. The user
    /// always sees a response: a real answer, or an assistant message
    /// carrying the service's detail string (falling back to
    /// [`GENERIC_ANSWER_FAILURE`]). Errors are appended and persisted as
    /// ordinary assistant messages, not visually distinguished.
    pub async fn submit(&self, question: &str) {
        let question = question.trim();
        if question.is_empty() || self.closed.load(Ordering::SeqCst) {
            return;
        }
        if !self.gate.read().await.is_ready() {
            return;
        }
        // One submit in flight per session; losers of this exchange no-op.
        if self
            .pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let epoch = self.epoch.load(Ordering::SeqCst);
        self.emit(SessionEvent::RequestStarted);

        self.append_local(ChatMessage::user(question)).await;
        self.persist(MessageRole::User, question).await;

        // The question travels separately as the query, so it is excluded
        // from its own context window.
        let context = {
            let transcript = self.transcript.read().await;
            build_context_window(&transcript[..transcript.len() - 1])
        };

        let outcome = self
            .answerer
            .ask(&self.document_id, question, &context)
            .await;
        if self.stale(epoch) {
            self.pending.store(false, Ordering::SeqCst);
            return;
        }

        let content = match outcome {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(
                    document_id = %self.document_id,
                    error = %err,
                    "answer service failed"
                );
                err.detail()
                    .map(str::to_string)
                    .unwrap_or_else(|| GENERIC_ANSWER_FAILURE.to_string())
            }
        };
        self.append_local(ChatMessage::assistant(&content)).await;
        self.persist(MessageRole::Assistant, &content).await;

        self.pending.store(false, Ordering::SeqCst);
        self.emit(SessionEvent::RequestFinished);
    }

    /// Tears the session down.
    ///
    /// Bumps the epoch so responses still in flight are discarded rather
    /// than applied to a dead session. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.emit(SessionEvent::Closed);
    }

    fn stale(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) != epoch
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.events.send(event);
    }

    /// Appends to the in-memory transcript and notifies subscribers.
    async fn append_local(&self, message: ChatMessage) {
        self.transcript.write().await.push(message.clone());
        self.emit(SessionEvent::MessageAppended { message });
    }

    /// Persists one message, swallowing failures.
    async fn persist(&self, role: MessageRole, content: &str) {
        if let Err(err) = self
            .store
            .append_message(&self.document_id, role, content)
            .await
        {
            tracing::warn!(
                document_id = %self.document_id,
                error = %err,
                "failed to persist chat message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChatError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    // Mock TranscriptStore backed by a HashMap
    struct MockStore {
        histories: Mutex<HashMap<String, Vec<ChatMessage>>>,
        fail_fetch: bool,
        fail_append: AtomicBool,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                histories: Mutex::new(HashMap::new()),
                fail_fetch: false,
                fail_append: AtomicBool::new(false),
            }
        }

        fn with_history(document_id: &str, messages: Vec<ChatMessage>) -> Self {
            let store = Self::new();
            store
                .histories
                .lock()
                .unwrap()
                .insert(document_id.to_string(), messages);
            store
        }

        fn stored(&self, document_id: &str) -> Vec<ChatMessage> {
            self.histories
                .lock()
                .unwrap()
                .get(document_id)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl TranscriptStore for MockStore {
        async fn fetch_history(&self, document_id: &str) -> Result<Vec<ChatMessage>> {
            if self.fail_fetch {
                return Err(ChatError::store_unavailable("history endpoint down"));
            }
            Ok(self.stored(document_id))
        }

        async fn append_message(
            &self,
            document_id: &str,
            role: MessageRole,
            content: &str,
        ) -> Result<()> {
            if self.fail_append.load(Ordering::SeqCst) {
                return Err(ChatError::store_unavailable("save endpoint down"));
            }
            self.histories
                .lock()
                .unwrap()
                .entry(document_id.to_string())
                .or_default()
                .push(ChatMessage::new(role, content));
            Ok(())
        }
    }

    struct MockExtractor {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MockExtractor {
        fn succeeding() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExtractionService for MockExtractor {
        async fn extract(&self, _document_id: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ChatError::transport("extraction endpoint down"))
            } else {
                Ok(())
            }
        }
    }

    struct MockAnswer {
        response: std::result::Result<String, ChatError>,
        seen_context: Mutex<Option<String>>,
    }

    impl MockAnswer {
        fn answering(answer: &str) -> Self {
            Self {
                response: Ok(answer.to_string()),
                seen_context: Mutex::new(None),
            }
        }

        fn failing(err: ChatError) -> Self {
            Self {
                response: Err(err),
                seen_context: Mutex::new(None),
            }
        }

        fn seen_context(&self) -> Option<String> {
            self.seen_context.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnswerService for MockAnswer {
        async fn ask(&self, _document_id: &str, _question: &str, context: &str) -> Result<String> {
            *self.seen_context.lock().unwrap() = Some(context.to_string());
            self.response.clone()
        }
    }

    // Answer service that blocks until released, for in-flight tests
    struct BlockingAnswer {
        release: Notify,
        answer: String,
    }

    impl BlockingAnswer {
        fn new(answer: &str) -> Self {
            Self {
                release: Notify::new(),
                answer: answer.to_string(),
            }
        }
    }

    #[async_trait]
    impl AnswerService for BlockingAnswer {
        async fn ask(&self, _document_id: &str, _question: &str, _context: &str) -> Result<String> {
            self.release.notified().await;
            Ok(self.answer.clone())
        }
    }

    fn session_with(
        store: Arc<MockStore>,
        extractor: Arc<MockExtractor>,
        answerer: Arc<dyn AnswerService>,
    ) -> ChatSession {
        ChatSession::new("doc-1", "Attention Is All You Need", store, extractor, answerer)
    }

    #[tokio::test]
    async fn empty_history_and_successful_extraction_yields_welcome() {
        let store = Arc::new(MockStore::new());
        let extractor = Arc::new(MockExtractor::succeeding());
        let session = session_with(
            store.clone(),
            extractor.clone(),
            Arc::new(MockAnswer::answering("ok")),
        );

        session.start().await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role, MessageRole::Assistant);
        assert!(transcript[0].content.contains("Attention Is All You Need"));
        assert_eq!(session.extraction_state().await, ExtractionState::Ready);
        assert!(session.submit_allowed().await);
        assert_eq!(extractor.call_count(), 1);
        // Welcome message was persisted
        assert_eq!(store.stored("doc-1").len(), 1);
    }

    #[tokio::test]
    async fn failed_extraction_is_terminal_and_visible() {
        let store = Arc::new(MockStore::new());
        let extractor = Arc::new(MockExtractor::failing());
        let session = session_with(
            store.clone(),
            extractor.clone(),
            Arc::new(MockAnswer::answering("ok")),
        );

        session.start().await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].content, EXTRACTION_FAILED_MESSAGE);
        assert_eq!(session.extraction_state().await, ExtractionState::Failed);
        assert!(!session.submit_allowed().await);

        // No retry: submitting and re-starting never re-triggers extraction
        session.submit("hello?").await;
        session.start().await;
        assert_eq!(extractor.call_count(), 1);
        assert_eq!(session.transcript().await.len(), 1);
    }

    #[tokio::test]
    async fn extraction_failure_message_survives_persist_failure() {
        let store = Arc::new(MockStore::new());
        store.fail_append.store(true, Ordering::SeqCst);
        let session = session_with(
            store.clone(),
            Arc::new(MockExtractor::failing()),
            Arc::new(MockAnswer::answering("ok")),
        );

        session.start().await;

        let transcript = session.transcript().await;
        assert_eq!(transcript[0].content, EXTRACTION_FAILED_MESSAGE);
        assert!(store.stored("doc-1").is_empty());
    }

    #[tokio::test]
    async fn non_empty_history_skips_extraction() {
        let history = vec![
            ChatMessage::user("What is the main contribution?"),
            ChatMessage::assistant("A new attention mechanism."),
        ];
        let store = Arc::new(MockStore::with_history("doc-1", history.clone()));
        let extractor = Arc::new(MockExtractor::succeeding());
        let session = session_with(
            store,
            extractor.clone(),
            Arc::new(MockAnswer::answering("ok")),
        );

        session.start().await;

        assert_eq!(extractor.call_count(), 0);
        assert_eq!(session.extraction_state().await, ExtractionState::Ready);
        assert_eq!(session.transcript().await, history);
    }

    #[tokio::test]
    async fn start_twice_extracts_at_most_once() {
        let store = Arc::new(MockStore::new());
        let extractor = Arc::new(MockExtractor::succeeding());
        let session = session_with(
            store,
            extractor.clone(),
            Arc::new(MockAnswer::answering("ok")),
        );

        session.start().await;
        session.start().await;

        assert_eq!(extractor.call_count(), 1);
        assert_eq!(session.transcript().await.len(), 1);
    }

    #[tokio::test]
    async fn history_load_failure_degrades_to_fresh_session() {
        let mut store = MockStore::new();
        store.fail_fetch = true;
        let extractor = Arc::new(MockExtractor::succeeding());
        let session = session_with(
            Arc::new(store),
            extractor.clone(),
            Arc::new(MockAnswer::answering("ok")),
        );

        session.start().await;

        assert_eq!(extractor.call_count(), 1);
        assert_eq!(session.extraction_state().await, ExtractionState::Ready);
    }

    #[tokio::test]
    async fn submit_is_noop_before_ready_and_for_blank_input() {
        let store = Arc::new(MockStore::new());
        let answerer = Arc::new(MockAnswer::answering("ok"));
        let session = session_with(
            store,
            Arc::new(MockExtractor::succeeding()),
            answerer.clone(),
        );

        // Gate still NotStarted
        session.submit("early question").await;
        assert!(session.transcript().await.is_empty());

        session.start().await;

        // Blank input is rejected locally
        session.submit("   ").await;
        assert_eq!(session.transcript().await.len(), 1);
        assert!(answerer.seen_context().is_none());
    }

    #[tokio::test]
    async fn submit_appends_user_then_assistant_with_prior_context() {
        let history = vec![
            ChatMessage::user("What problem does it solve?"),
            ChatMessage::assistant("Sequence transduction."),
        ];
        let store = Arc::new(MockStore::with_history("doc-1", history));
        let answerer = Arc::new(MockAnswer::answering("Self-attention."));
        let session = session_with(
            store.clone(),
            Arc::new(MockExtractor::succeeding()),
            answerer.clone(),
        );

        session.start().await;
        session.submit("What is the main contribution?").await;

        // Context covers the two prior messages, not the new question
        assert_eq!(
            answerer.seen_context().unwrap(),
            "User: What problem does it solve?\n\nAssistant: Sequence transduction."
        );

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[2].role, MessageRole::User);
        assert_eq!(transcript[2].content, "What is the main contribution?");
        assert_eq!(transcript[3].role, MessageRole::Assistant);
        assert_eq!(transcript[3].content, "Self-attention.");

        // Both new messages were persisted in order
        let stored = store.stored("doc-1");
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[3].content, "Self-attention.");
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn answer_failure_surfaces_service_detail() {
        let store = Arc::new(
            MockStore::with_history("doc-1", vec![ChatMessage::assistant("ready")]),
        );
        let answerer = Arc::new(MockAnswer::failing(ChatError::api(
            Some(429),
            Some("rate limited".to_string()),
        )));
        let session = session_with(store, Arc::new(MockExtractor::succeeding()), answerer);

        session.start().await;
        session.submit("anything?").await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.last().unwrap().content, "rate limited");
        // Session stays usable for further questions
        assert!(session.submit_allowed().await);
    }

    #[tokio::test]
    async fn answer_failure_without_detail_uses_generic_fallback() {
        let store = Arc::new(
            MockStore::with_history("doc-1", vec![ChatMessage::assistant("ready")]),
        );
        let answerer = Arc::new(MockAnswer::failing(ChatError::transport(
            "connection reset",
        )));
        let session = session_with(store.clone(), Arc::new(MockExtractor::succeeding()), answerer);

        session.start().await;
        session.submit("anything?").await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.last().unwrap().content, GENERIC_ANSWER_FAILURE);
        // The error message is persisted like any assistant message
        assert_eq!(store.stored("doc-1").last().unwrap().content, GENERIC_ANSWER_FAILURE);
    }

    #[tokio::test]
    async fn persist_failure_never_blocks_display() {
        let store = Arc::new(
            MockStore::with_history("doc-1", vec![ChatMessage::assistant("ready")]),
        );
        let session = session_with(
            store.clone(),
            Arc::new(MockExtractor::succeeding()),
            Arc::new(MockAnswer::answering("The answer.")),
        );

        session.start().await;
        store.fail_append.store(true, Ordering::SeqCst);
        session.submit("question?").await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.last().unwrap().content, "The answer.");
        // Nothing new reached the store
        assert_eq!(store.stored("doc-1").len(), 1);
    }

    #[tokio::test]
    async fn persisted_transcript_round_trips_through_a_fresh_start() {
        let store = Arc::new(MockStore::new());
        let session = session_with(
            store.clone(),
            Arc::new(MockExtractor::succeeding()),
            Arc::new(MockAnswer::answering("It introduces the transformer.")),
        );

        session.start().await;
        session.submit("What is it about?").await;
        session.close();

        let revived = session_with(
            store.clone(),
            Arc::new(MockExtractor::succeeding()),
            Arc::new(MockAnswer::answering("unused")),
        );
        revived.start().await;

        let transcript = revived.transcript().await;
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].role, MessageRole::Assistant);
        assert_eq!(transcript[1].role, MessageRole::User);
        assert_eq!(transcript[1].content, "What is it about?");
        assert_eq!(transcript[2].content, "It introduces the transformer.");
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_noop() {
        let store = Arc::new(
            MockStore::with_history("doc-1", vec![ChatMessage::assistant("ready")]),
        );
        let answerer = Arc::new(BlockingAnswer::new("first answer"));
        let session = Arc::new(ChatSession::new(
            "doc-1",
            "Paper",
            store,
            Arc::new(MockExtractor::succeeding()),
            answerer.clone(),
        ));

        session.start().await;

        let running = {
            let session = session.clone();
            tokio::spawn(async move { session.submit("first").await })
        };
        // Let the first submit reach the blocked answer call
        while !session.is_pending() {
            tokio::task::yield_now().await;
        }
        assert!(session.is_pending());
        assert!(!session.submit_allowed().await);

        session.submit("second").await;

        answerer.release.notify_one();
        running.await.unwrap();

        let transcript = session.transcript().await;
        let user_messages: Vec<_> = transcript
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .collect();
        assert_eq!(user_messages.len(), 1);
        assert_eq!(user_messages[0].content, "first");
        assert_eq!(transcript.last().unwrap().content, "first answer");
    }

    #[tokio::test]
    async fn late_response_after_close_is_discarded() {
        let store = Arc::new(
            MockStore::with_history("doc-1", vec![ChatMessage::assistant("ready")]),
        );
        let answerer = Arc::new(BlockingAnswer::new("too late"));
        let session = Arc::new(ChatSession::new(
            "doc-1",
            "Paper",
            store.clone(),
            Arc::new(MockExtractor::succeeding()),
            answerer.clone(),
        ));

        session.start().await;

        let running = {
            let session = session.clone();
            tokio::spawn(async move { session.submit("question").await })
        };
        while !session.is_pending() {
            tokio::task::yield_now().await;
        }

        session.close();
        answerer.release.notify_one();
        running.await.unwrap();

        // The user's optimistic append happened before teardown; the late
        // answer must not have been applied.
        let transcript = session.transcript().await;
        assert_eq!(transcript.last().unwrap().content, "question");
        assert!(!session.is_pending());
        // And nothing was persisted after the close
        assert_eq!(store.stored("doc-1").last().unwrap().content, "question");
    }

    #[tokio::test]
    async fn events_track_extraction_and_messages() {
        let store = Arc::new(MockStore::new());
        let session = session_with(
            store,
            Arc::new(MockExtractor::succeeding()),
            Arc::new(MockAnswer::answering("ok")),
        );
        let mut events = session.subscribe();

        session.start().await;

        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::ExtractionChanged {
                state: ExtractionState::InProgress
            }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::ExtractionChanged {
                state: ExtractionState::Ready
            }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::MessageAppended { .. }
        ));
    }
}
