use super::super::turn::{Turn, TurnId};
use super::{ConversationStore, StoreEvent};
use crate::error::ChatError;

impl ConversationStore {
    pub fn append_user_turn(&mut self, text: &str) -> TurnId {
        let id = self.allocate_id();
        self.turns.push(Turn::user(id, text));
        self.emit(StoreEvent::Appended(id));
        id
    }

    /// Append an empty assistant turn and make it the streaming target.
    pub fn append_placeholder_assistant_turn(&mut self) -> Result<TurnId, ChatError> {
        if self.active.is_some() {
            return Err(ChatError::TurnAlreadyActive);
        }

        let id = self.allocate_id();
        self.turns.push(Turn::assistant_placeholder(id));
        self.active = Some(id);
        self.emit(StoreEvent::Appended(id));
        Ok(id)
    }

    /// Replace the active turn's content with the latest accumulated text and
    /// re-derive its thinking and visible parts.
    ///
    /// Content only grows: text that does not extend the current content is
    /// ignored and no event is sent.
    pub fn update_active_turn_content(&mut self, accumulated: &str) -> Result<TurnId, ChatError> {
        let index = self.active_index().ok_or(ChatError::NoActiveTurn)?;
        let turn = &mut self.turns[index];
        if !accumulated.starts_with(turn.raw_content()) {
            tracing::warn!(
                turn = %turn.id(),
                current = turn.raw_content().len(),
                offered = accumulated.len(),
                "ignoring content that does not extend the active turn"
            );
            return Ok(turn.id());
        }

        let split = self.splitter.split(accumulated);
        turn.apply_content(accumulated, split);
        let id = turn.id();

        self.emit(StoreEvent::Updated(id));
        Ok(id)
    }

    pub fn finalize_active_turn(&mut self) -> Result<TurnId, ChatError> {
        let id = self.active.take().ok_or(ChatError::NoActiveTurn)?;
        self.emit(StoreEvent::Finalized(id));
        Ok(id)
    }

    /// Remove the active turn entirely. Its id is not handed out again.
    pub fn rollback_active_turn(&mut self) -> Result<Turn, ChatError> {
        let index = self.active_index().ok_or(ChatError::NoActiveTurn)?;
        self.active = None;
        let removed = self.turns.remove(index);
        self.emit(StoreEvent::RolledBack(removed.id()));
        Ok(removed)
    }
}
