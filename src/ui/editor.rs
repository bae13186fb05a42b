use crate::runtime::frontend::ScrollAction;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const PAGE_STEP: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Submit(String),
    Interrupt,
    Quit,
    Scroll(ScrollAction),
    ToggleThinking,
    CopyLastReply,
    DismissError,
}

/// Single text box of the chat screen. The cursor is a byte offset that
/// always sits on a char boundary.
///
/// While `busy` is set, Enter still reports the text but leaves it in the box.
#[derive(Debug, Default)]
pub struct InputEditor {
    buffer: String,
    cursor: usize,
    busy: bool,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    fn clamp_cursor_to_boundary_left(&self, mut idx: usize) -> usize {
        idx = idx.min(self.buffer.len());
        while idx > 0 && !self.buffer.is_char_boundary(idx) {
            idx -= 1;
        }
        idx
    }

    fn prev_char_boundary(&self, idx: usize) -> usize {
        let idx = self.clamp_cursor_to_boundary_left(idx);
        self.buffer[..idx]
            .char_indices()
            .next_back()
            .map_or(0, |(start, _)| start)
    }

    fn next_char_boundary(&self, idx: usize) -> usize {
        let idx = self.clamp_cursor_to_boundary_left(idx);
        self.buffer[idx..]
            .chars()
            .next()
            .map_or(self.buffer.len(), |ch| idx + ch.len_utf8())
    }

    pub fn insert_str(&mut self, value: &str) {
        let cursor = self.clamp_cursor_to_boundary_left(self.cursor);
        self.buffer.insert_str(cursor, value);
        self.cursor = cursor + value.len();
    }

    pub fn backspace(&mut self) {
        let end = self.clamp_cursor_to_boundary_left(self.cursor);
        if end == 0 {
            return;
        }
        let start = self.prev_char_boundary(end);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        let start = self.clamp_cursor_to_boundary_left(self.cursor);
        if start >= self.buffer.len() {
            return;
        }
        let end = self.next_char_boundary(start);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Takes the buffer unless it is blank. Blank input stays in the box, and
    /// so does any input submitted while busy.
    pub fn submit(&mut self) -> Option<String> {
        if self.buffer.trim().is_empty() {
            return None;
        }
        let value = self.buffer.trim_end_matches(['\n', '\r']).to_string();
        if !self.busy {
            self.clear();
        }
        Some(value)
    }

    pub fn apply_event(&mut self, event: Event) -> EditorAction {
        match event {
            Event::Paste(text) => {
                self.insert_str(&text);
                EditorAction::None
            }
            Event::Key(key) if key.kind != KeyEventKind::Release => self.apply_key(key),
            _ => EditorAction::None,
        }
    }

    pub fn apply_key(&mut self, key: KeyEvent) -> EditorAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return EditorAction::Interrupt,
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    return EditorAction::Quit;
                }
            }
            KeyCode::Char('t') if ctrl => return EditorAction::ToggleThinking,
            KeyCode::Char('y') if ctrl => return EditorAction::CopyLastReply,
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Char('j') if ctrl => self.insert_str("\n"),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.insert_str("\n")
            }
            KeyCode::Enter => {
                if let Some(value) = self.submit() {
                    return EditorAction::Submit(value);
                }
            }
            KeyCode::Esc => return EditorAction::DismissError,
            KeyCode::PageUp => return EditorAction::Scroll(ScrollAction::PageUp(PAGE_STEP)),
            KeyCode::PageDown => return EditorAction::Scroll(ScrollAction::PageDown(PAGE_STEP)),
            KeyCode::Up => return EditorAction::Scroll(ScrollAction::LineUp),
            KeyCode::Down => return EditorAction::Scroll(ScrollAction::LineDown),
            KeyCode::Home if ctrl => return EditorAction::Scroll(ScrollAction::Home),
            KeyCode::End if ctrl => return EditorAction::Scroll(ScrollAction::End),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Left => self.cursor = self.prev_char_boundary(self.cursor),
            KeyCode::Right => self.cursor = self.next_char_boundary(self.cursor),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                let mut encoded = [0u8; 4];
                self.insert_str(ch.encode_utf8(&mut encoded));
            }
            _ => {}
        }

        EditorAction::None
    }
}
