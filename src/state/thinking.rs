//! Splits accumulated assistant text into its thinking span and the visible
//! answer.
//!
//! The thinking span is a plain-text convention inside the streamed content:
//! everything between the first opening marker and the first closing marker
//! after it. Only that first pair counts; marker text that appears later is
//! ordinary visible content.
//!
//! `split` is a pure function of the text. Callers re-run it on the whole
//! accumulated text after every fragment instead of keeping the pieces as
//! separate mutable state.

use crate::config::{DEFAULT_THINK_CLOSE, DEFAULT_THINK_OPEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingSplit {
    pub thinking: Option<String>,
    pub visible_response: String,
    pub thinking_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingSplitter {
    open: String,
    close: String,
}

impl Default for ThinkingSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_THINK_OPEN, DEFAULT_THINK_CLOSE)
    }
}

impl ThinkingSplitter {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    pub fn open_marker(&self) -> &str {
        &self.open
    }

    pub fn close_marker(&self) -> &str {
        &self.close
    }

    pub fn split(&self, text: &str) -> ThinkingSplit {
        let open_at = if self.open.is_empty() {
            None
        } else {
            text.find(&self.open)
        };
        let Some(open_at) = open_at else {
            return ThinkingSplit {
                thinking: None,
                visible_response: text.to_string(),
                thinking_complete: false,
            };
        };

        let before = &text[..open_at];
        let body_start = open_at + self.open.len();
        let close_at = if self.close.is_empty() {
            None
        } else {
            text[body_start..]
                .find(&self.close)
                .map(|offset| body_start + offset)
        };

        match close_at {
            None => ThinkingSplit {
                thinking: Some(text[body_start..].to_string()),
                visible_response: before.to_string(),
                thinking_complete: false,
            },
            Some(close_at) => {
                let after = &text[close_at + self.close.len()..];
                let mut visible_response = String::with_capacity(before.len() + after.len());
                visible_response.push_str(before);
                visible_response.push_str(after);
                ThinkingSplit {
                    thinking: Some(text[body_start..close_at].to_string()),
                    visible_response,
                    thinking_complete: true,
                }
            }
        }
    }

    /// Byte length of a trailing, still incomplete opening marker.
    pub fn pending_open_suffix(&self, text: &str) -> usize {
        partial_marker_suffix(text, &self.open)
    }

    /// Byte length of a trailing, still incomplete closing marker.
    pub fn pending_close_suffix(&self, text: &str) -> usize {
        partial_marker_suffix(text, &self.close)
    }
}

/// Longest proper prefix of `marker` that `text` ends with.
fn partial_marker_suffix(text: &str, marker: &str) -> usize {
    (1..marker.len())
        .rev()
        .filter(|len| marker.is_char_boundary(*len))
        .find(|len| text.ends_with(&marker[..*len]))
        .unwrap_or(0)
}
