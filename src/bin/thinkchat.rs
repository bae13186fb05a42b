use anyhow::Result;
use crossterm::event;
use std::time::Duration;
use thinkchat::app::{build_runtime, ChatMode};
use thinkchat::config::Config;
use thinkchat::logging;
use thinkchat::runtime::frontend::{FrontendAdapter, UserInputEvent};
use thinkchat::runtime::mode::RuntimeMode;
use thinkchat::terminal::TerminalGuard;
use thinkchat::ui::editor::{EditorAction, InputEditor};
use thinkchat::ui::input_metrics::input_visual_rows;
use thinkchat::ui::layout::split_chat_layout;
use thinkchat::ui::render::{
    render_error_banner, render_input, render_messages, render_status_line, transcript_lines,
    wrap_styled_lines, PlainRenderer, TranscriptView,
};

const POLL_INTERVAL: Duration = Duration::from_millis(16);
const MAX_INPUT_ROWS: usize = 6;

struct TuiFrontend {
    terminal: TerminalGuard,
    editor: InputEditor,
    renderer: PlainRenderer,
    max_offset: usize,
    quit: bool,
}

impl TuiFrontend {
    fn new() -> Result<Self> {
        Ok(Self {
            terminal: TerminalGuard::enter()?,
            editor: InputEditor::new(),
            renderer: PlainRenderer,
            max_offset: 0,
            quit: false,
        })
    }

    fn map_action(&mut self, action: EditorAction) -> Option<UserInputEvent> {
        match action {
            EditorAction::None => None,
            EditorAction::Submit(text) => Some(UserInputEvent::Text(text)),
            EditorAction::Interrupt => Some(UserInputEvent::Interrupt),
            EditorAction::Quit => {
                self.quit = true;
                None
            }
            EditorAction::Scroll(action) => Some(UserInputEvent::Scroll {
                action,
                max_offset: self.max_offset,
            }),
            EditorAction::ToggleThinking => Some(UserInputEvent::ToggleThinking),
            EditorAction::CopyLastReply => Some(UserInputEvent::CopyLastReply),
            EditorAction::DismissError => Some(UserInputEvent::DismissError),
        }
    }
}

impl FrontendAdapter<ChatMode> for TuiFrontend {
    fn poll_user_input(&mut self, mode: &ChatMode) -> Option<UserInputEvent> {
        if mode.quit_requested() {
            self.quit = true;
            return None;
        }

        let Ok(has_event) = event::poll(POLL_INTERVAL) else {
            self.quit = true;
            return None;
        };
        if !has_event {
            return None;
        }

        let Ok(ev) = event::read() else {
            self.quit = true;
            return None;
        };
        self.editor.set_busy(mode.is_turn_in_progress());
        let action = self.editor.apply_event(ev);
        self.map_action(action)
    }

    fn render(&mut self, mode: &ChatMode) {
        let status = mode.status_line();
        let view = TranscriptView {
            turns: mode.turns(),
            active: mode.active_turn_id(),
            splitter: mode.splitter(),
            thinking_collapsed: mode.thinking_collapsed(),
        };
        let lines = transcript_lines(&view, &self.renderer);
        let banner = mode.error_banner();
        let scroll = mode.history_scroll();
        let busy = mode.is_turn_in_progress();
        let input = self.editor.buffer();
        let cursor = self.editor.cursor();
        let mut max_offset = self.max_offset;

        let drawn = self.terminal.terminal_mut().draw(|frame| {
            let area = frame.area();
            let input_width = area.width.saturating_sub(2).max(1) as usize;
            let input_rows =
                input_visual_rows(input, input_width).clamp(1, MAX_INPUT_ROWS) as u16;
            let panes = split_chat_layout(area, u16::from(banner.is_some()), input_rows);

            render_status_line(frame, panes.header, &status);
            let rows = wrap_styled_lines(&lines, panes.history.width as usize);
            max_offset = render_messages(frame, panes.history, &rows, scroll);
            if let Some(message) = banner {
                render_error_banner(frame, panes.banner, message);
            }
            render_input(frame, panes.input, input, cursor, busy);
        });
        if let Err(error) = drawn {
            tracing::warn!(%error, "frame draw failed");
        }
        self.max_offset = max_offset;
    }

    fn should_quit(&self) -> bool {
        self.quit
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;
    let log_target = logging::init()?;
    tracing::info!(
        api_url = %config.api_url,
        username = %config.username,
        log = ?log_target,
        "thinkchat starting"
    );

    let (mut runtime, mut ctx) = build_runtime(config)?;
    let mut frontend = TuiFrontend::new()?;
    runtime.run(&mut frontend, &mut ctx).await;
    Ok(())
}
