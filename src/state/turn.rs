use super::thinking::ThinkingSplit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-unique turn identifier. Ids are handed out in increasing order and
/// never reused, even after a rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(u64);

impl TurnId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One message of the transcript.
///
/// `thinking`, `thinking_complete` and `visible_response` are always derived
/// from `raw_content`; only the store writes them, and only together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    id: TurnId,
    role: Role,
    raw_content: String,
    thinking: Option<String>,
    thinking_complete: bool,
    visible_response: String,
}

impl Turn {
    pub(crate) fn user(id: TurnId, text: &str) -> Self {
        Self {
            id,
            role: Role::User,
            raw_content: text.to_string(),
            thinking: None,
            thinking_complete: false,
            visible_response: text.to_string(),
        }
    }

    pub(crate) fn assistant_placeholder(id: TurnId) -> Self {
        Self {
            id,
            role: Role::Assistant,
            raw_content: String::new(),
            thinking: None,
            thinking_complete: false,
            visible_response: String::new(),
        }
    }

    pub(crate) fn apply_content(&mut self, raw_content: &str, split: ThinkingSplit) {
        self.raw_content.clear();
        self.raw_content.push_str(raw_content);
        self.thinking = split.thinking;
        self.thinking_complete = split.thinking_complete;
        self.visible_response = split.visible_response;
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    pub fn thinking(&self) -> Option<&str> {
        self.thinking.as_deref()
    }

    pub fn thinking_complete(&self) -> bool {
        self.thinking_complete
    }

    pub fn visible_response(&self) -> &str {
        &self.visible_response
    }

    pub fn is_empty(&self) -> bool {
        self.raw_content.is_empty()
    }
}
