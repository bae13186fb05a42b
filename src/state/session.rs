use super::accumulator::ContentAccumulator;
use super::conversation::{ConversationStore, StoreEvent};
use super::thinking::ThinkingSplitter;
use super::turn::{Turn, TurnId};
use crate::api::client::ChatTransport;
use crate::api::decoder::StreamDecoder;
use crate::api::stream::{LineBatch, LineEventParser, DEFAULT_MAX_LINE_BYTES};
use crate::config::Config;
use crate::error::ChatError;
use crate::types::{ChatRequest, WireEvent};
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// How one call to [`ChatSession::submit`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    /// Another turn was still streaming. The input is dropped, not queued.
    Rejected,
    /// The stream reached its end and the assistant turn was finalized.
    Completed {
        turn_id: TurnId,
        stream_error: Option<String>,
    },
    /// The transport failed after content arrived. The partial turn is kept.
    Interrupted { turn_id: TurnId, error: ChatError },
    /// The transport failed before any content arrived. The placeholder is gone.
    RolledBack { error: ChatError },
}

impl SubmitOutcome {
    pub fn turn_id(&self) -> Option<TurnId> {
        match self {
            Self::Completed { turn_id, .. } | Self::Interrupted { turn_id, .. } => Some(*turn_id),
            _ => None,
        }
    }
}

/// Read-only copy of the session for one frame of the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub turns: Vec<Turn>,
    pub active: Option<TurnId>,
    pub error_banner: Option<String>,
    pub loading: bool,
}

struct SessionState {
    store: ConversationStore,
    error_banner: Option<String>,
}

/// Submission boundary around a [`ConversationStore`].
///
/// Cloning is cheap and every clone drives the same transcript, so the UI can
/// keep reading while a submission runs on another task.
pub struct ChatSession<T: ChatTransport> {
    transport: Arc<T>,
    state: Arc<Mutex<SessionState>>,
    loading: Arc<AtomicBool>,
    username: String,
    max_line_bytes: usize,
}

impl<T: ChatTransport> Clone for ChatSession<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            state: Arc::clone(&self.state),
            loading: Arc::clone(&self.loading),
            username: self.username.clone(),
            max_line_bytes: self.max_line_bytes,
        }
    }
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: T, username: impl Into<String>, splitter: ThinkingSplitter) -> Self {
        Self {
            transport: Arc::new(transport),
            state: Arc::new(Mutex::new(SessionState {
                store: ConversationStore::new(splitter),
                error_banner: None,
            })),
            loading: Arc::new(AtomicBool::new(false)),
            username: username.into(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    pub fn from_config(transport: T, config: &Config) -> Self {
        Self::new(
            transport,
            config.username.clone(),
            ThinkingSplitter::new(config.think_open.clone(), config.think_close.clone()),
        )
        .with_max_line_bytes(config.max_line_bytes)
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn error_banner(&self) -> Option<String> {
        self.state.lock().error_banner.clone()
    }

    pub fn dismiss_error(&self) {
        self.state.lock().error_banner = None;
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.state.lock().store.turns().to_vec()
    }

    pub fn turn(&self, id: TurnId) -> Option<Turn> {
        self.state.lock().store.get(id).cloned()
    }

    pub fn active_turn_id(&self) -> Option<TurnId> {
        self.state.lock().store.active_id()
    }

    pub fn splitter(&self) -> ThinkingSplitter {
        self.state.lock().store.splitter().clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot {
            turns: state.store.turns().to_vec(),
            active: state.store.active_id(),
            error_banner: state.error_banner.clone(),
            loading: self.is_loading(),
        }
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreEvent> {
        self.state.lock().store.subscribe()
    }

    /// Send `text` and stream the reply into a new assistant turn.
    ///
    /// Transport and stream errors end up in the banner and the returned
    /// outcome; only store faults come back as `Err`.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, ChatError> {
        if text.trim().is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }
        let Some(_loading) = LoadingGuard::acquire(&self.loading) else {
            tracing::debug!("submission dropped while a reply is streaming");
            return Ok(SubmitOutcome::Rejected);
        };

        let turn_id = {
            let mut state = self.state.lock();
            if state.store.active_id().is_some() {
                return Err(ChatError::TurnAlreadyActive);
            }
            state.error_banner = None;
            state.store.append_user_turn(text);
            state.store.append_placeholder_assistant_turn()?
        };
        let mut open_turn = OpenTurnGuard::new(&self.state, turn_id);
        tracing::debug!(turn = %turn_id, "assistant turn opened");

        let request = ChatRequest {
            message: text.to_string(),
            username: self.username.clone(),
        };
        let mut stream = match self.transport.open_stream(&request).await {
            Ok(stream) => stream,
            Err(error) => return self.abort(turn_id, &ContentAccumulator::new(), error),
        };

        let mut decoder = StreamDecoder::new();
        let mut parser = LineEventParser::with_max_line_bytes(self.max_line_bytes);
        let mut accumulator = ContentAccumulator::new();
        let mut stream_error = None;

        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    let fragment = decoder.decode(&chunk);
                    if fragment.is_empty() {
                        continue;
                    }
                    let batch = parser.push(&fragment);
                    self.apply_batch(batch, &mut accumulator, &mut stream_error)?;
                    open_turn.has_content = !accumulator.is_empty();
                }
                Err(error) => return self.abort(turn_id, &accumulator, error),
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            let batch = parser.push(&tail);
            self.apply_batch(batch, &mut accumulator, &mut stream_error)?;
        }
        let batch = parser.finish();
        self.apply_batch(batch, &mut accumulator, &mut stream_error)?;

        self.state.lock().store.finalize_active_turn()?;
        tracing::debug!(
            turn = %turn_id,
            fragments = accumulator.fragments(),
            bytes = accumulator.len(),
            malformed = parser.malformed_count(),
            "assistant turn finalized"
        );
        Ok(SubmitOutcome::Completed {
            turn_id,
            stream_error,
        })
    }

    fn apply_batch(
        &self,
        batch: LineBatch,
        accumulator: &mut ContentAccumulator,
        stream_error: &mut Option<String>,
    ) -> Result<(), ChatError> {
        for event in batch.events {
            match event {
                WireEvent::Content(text) => {
                    accumulator.push(&text);
                    self.state
                        .lock()
                        .store
                        .update_active_turn_content(accumulator.as_str())?;
                }
                WireEvent::Error(message) => {
                    let error = ChatError::StreamEvent(message);
                    tracing::warn!(%error, "chat service reported an error");
                    self.state.lock().error_banner = error.user_message();
                    *stream_error = error.user_message();
                }
                WireEvent::Unrecognized => {}
            }
        }
        Ok(())
    }

    fn abort(
        &self,
        turn_id: TurnId,
        accumulator: &ContentAccumulator,
        error: ChatError,
    ) -> Result<SubmitOutcome, ChatError> {
        let mut state = self.state.lock();
        state.error_banner = error.user_message();

        if accumulator.is_empty() {
            state.store.rollback_active_turn()?;
            tracing::warn!(
                turn = %turn_id,
                %error,
                "request failed before any content; turn rolled back"
            );
            Ok(SubmitOutcome::RolledBack { error })
        } else {
            state.store.finalize_active_turn()?;
            tracing::warn!(
                turn = %turn_id,
                bytes = accumulator.len(),
                %error,
                "stream broke off; partial turn kept"
            );
            Ok(SubmitOutcome::Interrupted { turn_id, error })
        }
    }
}

/// Settles the assistant turn if the submission is dropped while it streams.
///
/// Declared after the loading guard so it runs first: the turn is closed
/// before another submission can start.
struct OpenTurnGuard<'a> {
    state: &'a Mutex<SessionState>,
    turn_id: TurnId,
    has_content: bool,
}

impl<'a> OpenTurnGuard<'a> {
    fn new(state: &'a Mutex<SessionState>, turn_id: TurnId) -> Self {
        Self {
            state,
            turn_id,
            has_content: false,
        }
    }
}

impl Drop for OpenTurnGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if !state.store.is_active(self.turn_id) {
            return;
        }

        let settled = if self.has_content {
            state.store.finalize_active_turn().map(|_| "finalized")
        } else {
            state.store.rollback_active_turn().map(|_| "rolled back")
        };
        match settled {
            Ok(action) => {
                tracing::warn!(turn = %self.turn_id, action, "submission dropped mid-stream")
            }
            Err(error) => tracing::error!(turn = %self.turn_id, %error, "cannot settle dropped turn"),
        }
    }
}

/// Holds the loading flag for the lifetime of one submission.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
