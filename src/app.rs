use crate::api::{ChatTransport, HttpTransport};
use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::Config;
use crate::runtime::context::RuntimeContext;
use crate::runtime::frontend::{ScrollAction, UserInputEvent};
use crate::runtime::mode::RuntimeMode;
use crate::runtime::r#loop::Runtime;
use crate::runtime::UiUpdate;
use crate::state::{ChatSession, Role, SubmitOutcome, ThinkingSplitter, Turn, TurnId};
use crate::ui::render::HistoryScroll;
use anyhow::Result;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const NOTICE_TTL: Duration = Duration::from_secs(4);
const BUSY_NOTICE: &str = "[busy - reply in progress, input kept]";
const QUIT_NOTICE: &str = "[press Ctrl+C again to exit]";

struct HistoryState {
    scroll_offset: usize,
    auto_follow: bool,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            auto_follow: true,
        }
    }
}

struct Notice {
    text: String,
    shown_at: Instant,
}

/// View state of the chat screen. The transcript itself is a copy of the
/// session's store, refreshed on every store event.
pub struct ChatMode {
    turns: Vec<Turn>,
    active: Option<TurnId>,
    error_banner: Option<String>,
    splitter: ThinkingSplitter,
    history_state: HistoryState,
    turn_in_progress: bool,
    thinking_collapsed: bool,
    notice: Option<Notice>,
    clipboard: Box<dyn Clipboard>,
    pending_quit: bool,
    quit_requested: bool,
}

impl ChatMode {
    pub fn new(splitter: ThinkingSplitter, clipboard: Box<dyn Clipboard>) -> Self {
        Self {
            turns: Vec::new(),
            active: None,
            error_banner: None,
            splitter,
            history_state: HistoryState::default(),
            turn_in_progress: false,
            thinking_collapsed: false,
            notice: None,
            clipboard,
            pending_quit: false,
            quit_requested: false,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn active_turn_id(&self) -> Option<TurnId> {
        self.active
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.error_banner.as_deref()
    }

    pub fn splitter(&self) -> &ThinkingSplitter {
        &self.splitter
    }

    pub fn thinking_collapsed(&self) -> bool {
        self.thinking_collapsed
    }

    pub fn history_scroll(&self) -> HistoryScroll {
        HistoryScroll {
            offset: self.history_state.scroll_offset,
            follow: self.history_state.auto_follow,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|notice| notice.shown_at.elapsed() < NOTICE_TTL)
            .map(|notice| notice.text.as_str())
    }

    fn mode_status_label(&self) -> &'static str {
        if self.pending_quit {
            "quit-arm"
        } else if self.turn_in_progress {
            "streaming"
        } else {
            "ready"
        }
    }

    pub fn status_line(&self) -> String {
        let view = if self.history_state.auto_follow {
            "following"
        } else {
            "scrolled"
        };
        let mut status = format!(
            "thinkchat  mode:{} view:{} turns:{}",
            self.mode_status_label(),
            view,
            self.turns.len()
        );
        if let Some(notice) = self.notice() {
            status.push_str("  ");
            status.push_str(notice);
        }
        status
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    fn refresh<T: ChatTransport>(&mut self, session: &ChatSession<T>) {
        let snapshot = session.snapshot();
        self.turns = snapshot.turns;
        self.active = snapshot.active;
        self.error_banner = snapshot.error_banner;
    }

    fn apply_scroll(&mut self, action: ScrollAction, max_offset: usize) {
        let current = if self.history_state.auto_follow {
            max_offset
        } else {
            self.history_state.scroll_offset.min(max_offset)
        };
        let next = match action {
            ScrollAction::LineUp => current.saturating_sub(1),
            ScrollAction::LineDown => current.saturating_add(1).min(max_offset),
            ScrollAction::PageUp(step) => current.saturating_sub(step.max(1)),
            ScrollAction::PageDown(step) => current.saturating_add(step.max(1)).min(max_offset),
            ScrollAction::Home => 0,
            ScrollAction::End => max_offset,
        };
        self.history_state.scroll_offset = next;
        self.history_state.auto_follow = next >= max_offset;
    }

    fn copy_last_reply(&mut self) {
        let Some(text) = self
            .turns
            .iter()
            .rev()
            .find(|turn| turn.role() == Role::Assistant && !turn.is_empty())
            .map(|turn| turn.raw_content().to_string())
        else {
            self.notify("[nothing to copy]");
            return;
        };

        match self.clipboard.set_text(&text) {
            Ok(()) => self.notify("copied"),
            Err(error) => {
                tracing::warn!(%error, "copy to clipboard failed");
                self.notify(format!("[copy failed: {error}]"));
            }
        }
    }
}

impl RuntimeMode for ChatMode {
    fn on_user_input<T: ChatTransport>(&mut self, input: String, ctx: &mut RuntimeContext<T>) {
        if self.turn_in_progress {
            tracing::debug!("input held back while a reply is streaming");
            self.notify(BUSY_NOTICE);
            return;
        }

        self.pending_quit = false;
        self.quit_requested = false;
        self.turn_in_progress = true;
        ctx.start_turn(input);
    }

    fn on_model_update<T: ChatTransport>(&mut self, update: UiUpdate, ctx: &mut RuntimeContext<T>) {
        match update {
            UiUpdate::Store(_) => self.refresh(&ctx.session),
            UiUpdate::TurnComplete(outcome) => {
                self.turn_in_progress = false;
                self.refresh(&ctx.session);
                if outcome == SubmitOutcome::Rejected {
                    self.notify(BUSY_NOTICE);
                }
            }
            UiUpdate::Error(message) => {
                self.turn_in_progress = false;
                self.refresh(&ctx.session);
                self.notify(format!("[error] {message}"));
            }
        }
    }

    fn on_interrupt<T: ChatTransport>(&mut self, _ctx: &mut RuntimeContext<T>) {
        if self.pending_quit {
            self.quit_requested = true;
        } else {
            self.pending_quit = true;
            self.notify(QUIT_NOTICE);
        }
    }

    fn on_frontend_event<T: ChatTransport>(
        &mut self,
        event: UserInputEvent,
        ctx: &mut RuntimeContext<T>,
    ) {
        match event {
            UserInputEvent::Text(input) => self.on_user_input(input, ctx),
            UserInputEvent::Interrupt => self.on_interrupt(ctx),
            UserInputEvent::Scroll { action, max_offset } => self.apply_scroll(action, max_offset),
            UserInputEvent::ToggleThinking => self.thinking_collapsed = !self.thinking_collapsed,
            UserInputEvent::CopyLastReply => self.copy_last_reply(),
            UserInputEvent::DismissError => {
                ctx.session.dismiss_error();
                self.error_banner = None;
            }
        }
    }

    fn is_turn_in_progress(&self) -> bool {
        self.turn_in_progress
    }
}

pub fn build_runtime(config: Config) -> Result<(Runtime<ChatMode>, RuntimeContext<HttpTransport>)> {
    let transport = HttpTransport::new(&config)?;
    let session = ChatSession::from_config(transport, &config);
    let store_rx = session.subscribe();

    let (update_tx, update_rx) = mpsc::unbounded_channel::<UiUpdate>();
    let mode = ChatMode::new(session.splitter(), Box::new(SystemClipboard::new()));
    let ctx = RuntimeContext::new(session, update_tx);
    Ok((Runtime::new(mode, update_rx, store_rx), ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_client::{MockResponse, MockTransport};
    use crate::error::ChatError;
    use crate::state::StoreEvent;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedClipboard(Arc<Mutex<Option<String>>>);

    impl Clipboard for SharedClipboard {
        fn set_text(&mut self, text: &str) -> Result<()> {
            *self.0.lock() = Some(text.to_string());
            Ok(())
        }
    }

    struct Harness {
        mode: ChatMode,
        ctx: RuntimeContext<MockTransport>,
        update_rx: mpsc::UnboundedReceiver<UiUpdate>,
        store_rx: mpsc::UnboundedReceiver<StoreEvent>,
        clipboard: SharedClipboard,
    }

    impl Harness {
        fn new(responses: Vec<MockResponse>) -> Self {
            let session = ChatSession::new(
                MockTransport::new(responses),
                "cle",
                ThinkingSplitter::default(),
            );
            let store_rx = session.subscribe();
            let (update_tx, update_rx) = mpsc::unbounded_channel();
            let clipboard = SharedClipboard::default();
            Self {
                mode: ChatMode::new(session.splitter(), Box::new(clipboard.clone())),
                ctx: RuntimeContext::new(session, update_tx),
                update_rx,
                store_rx,
                clipboard,
            }
        }

        /// Feed updates to the mode until the running turn reports back.
        async fn finish_turn(&mut self) {
            let Some(update) = self.update_rx.recv().await else {
                panic!("update channel closed");
            };
            while let Ok(event) = self.store_rx.try_recv() {
                self.mode
                    .on_model_update(UiUpdate::Store(event), &mut self.ctx);
            }
            self.mode.on_model_update(update, &mut self.ctx);
        }

        fn send(&mut self, event: UserInputEvent) {
            self.mode.on_frontend_event(event, &mut self.ctx);
        }
    }

    #[tokio::test]
    async fn submitted_turn_appears_after_completion() {
        let mut harness = Harness::new(vec![MockResponse::lines(&[
            r#"{"message":"<think>hmm</think>"}"#,
            r#"{"message":"Hi there"}"#,
        ])]);

        harness.send(UserInputEvent::Text("Hello".to_string()));
        assert!(harness.mode.is_turn_in_progress());
        assert!(harness.mode.status_line().contains("mode:streaming"));

        harness.finish_turn().await;

        assert!(!harness.mode.is_turn_in_progress());
        assert_eq!(harness.mode.active_turn_id(), None);
        let turns = harness.mode.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].thinking(), Some("hmm"));
        assert_eq!(turns[1].visible_response(), "Hi there");
    }

    #[tokio::test]
    async fn busy_input_is_discarded_with_feedback() {
        let mut harness = Harness::new(Vec::new());
        harness.mode.turn_in_progress = true;

        harness.send(UserInputEvent::Text("hello".to_string()));

        assert_eq!(harness.mode.notice(), Some(BUSY_NOTICE));
        assert!(harness.ctx.session.transport().requests().is_empty());
        assert!(harness.mode.turns().is_empty());
    }

    #[tokio::test]
    async fn rejected_request_leaves_banner_until_dismissed() {
        let mut harness = Harness::new(vec![MockResponse::Reject(ChatError::Transport(
            "HTTP error! status: 502".to_string(),
        ))]);

        harness.send(UserInputEvent::Text("Hello".to_string()));
        harness.finish_turn().await;

        assert_eq!(harness.mode.error_banner(), Some("HTTP error! status: 502"));
        assert_eq!(harness.mode.turns().len(), 1);

        harness.send(UserInputEvent::DismissError);
        assert_eq!(harness.mode.error_banner(), None);
        assert_eq!(harness.ctx.session.error_banner(), None);
    }

    #[test]
    fn idle_interrupt_arms_then_quits() {
        let mut harness = Harness::new(Vec::new());

        harness.send(UserInputEvent::Interrupt);
        assert!(harness.mode.pending_quit);
        assert!(!harness.mode.quit_requested());
        assert_eq!(harness.mode.notice(), Some(QUIT_NOTICE));

        harness.send(UserInputEvent::Interrupt);
        assert!(harness.mode.quit_requested());
    }

    #[tokio::test]
    async fn pending_quit_resets_when_a_turn_starts() {
        let mut harness = Harness::new(vec![MockResponse::lines(&[r#"{"message":"ok"}"#])]);
        harness.send(UserInputEvent::Interrupt);
        assert!(harness.mode.pending_quit);

        harness.send(UserInputEvent::Text("resume".to_string()));
        assert!(!harness.mode.pending_quit);
        assert!(harness.mode.is_turn_in_progress());
        harness.finish_turn().await;
    }

    #[test]
    fn scrolling_up_stops_following_and_end_resumes() {
        let mut harness = Harness::new(Vec::new());
        let scroll = |action| UserInputEvent::Scroll {
            action,
            max_offset: 90,
        };

        harness.send(scroll(ScrollAction::PageUp(10)));
        assert_eq!(harness.mode.history_scroll().offset, 80);
        assert!(!harness.mode.history_scroll().follow);
        assert!(harness.mode.status_line().contains("view:scrolled"));

        harness.send(scroll(ScrollAction::LineDown));
        assert_eq!(harness.mode.history_scroll().offset, 81);

        harness.send(scroll(ScrollAction::Home));
        assert_eq!(harness.mode.history_scroll().offset, 0);

        harness.send(scroll(ScrollAction::PageDown(500)));
        assert_eq!(harness.mode.history_scroll().offset, 90);
        assert!(harness.mode.history_scroll().follow);

        harness.send(scroll(ScrollAction::LineUp));
        harness.send(scroll(ScrollAction::End));
        assert!(harness.mode.history_scroll().follow);
        assert!(!harness.mode.is_turn_in_progress());
    }

    #[tokio::test]
    async fn scroll_position_survives_streaming_updates() {
        let mut harness = Harness::new(vec![MockResponse::lines(&[r#"{"message":"more"}"#])]);
        harness.send(UserInputEvent::Scroll {
            action: ScrollAction::Home,
            max_offset: 40,
        });

        harness.send(UserInputEvent::Text("Hello".to_string()));
        harness.finish_turn().await;

        assert_eq!(harness.mode.history_scroll().offset, 0);
        assert!(!harness.mode.history_scroll().follow);
    }

    #[test]
    fn ctrl_t_toggles_thinking_panel() {
        let mut harness = Harness::new(Vec::new());
        assert!(!harness.mode.thinking_collapsed());
        harness.send(UserInputEvent::ToggleThinking);
        assert!(harness.mode.thinking_collapsed());
        harness.send(UserInputEvent::ToggleThinking);
        assert!(!harness.mode.thinking_collapsed());
    }

    #[tokio::test]
    async fn copy_takes_raw_content_of_last_reply() {
        let mut harness = Harness::new(vec![MockResponse::lines(&[
            r#"{"message":"<think>a</think>"}"#,
            r#"{"message":"b"}"#,
        ])]);
        harness.send(UserInputEvent::CopyLastReply);
        assert_eq!(harness.mode.notice(), Some("[nothing to copy]"));

        harness.send(UserInputEvent::Text("Hello".to_string()));
        harness.finish_turn().await;
        harness.send(UserInputEvent::CopyLastReply);

        assert_eq!(harness.mode.notice(), Some("copied"));
        assert_eq!(
            harness.clipboard.0.lock().as_deref(),
            Some("<think>a</think>b")
        );
    }
}
