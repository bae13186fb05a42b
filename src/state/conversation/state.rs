use super::super::thinking::ThinkingSplitter;
use super::super::turn::{Turn, TurnId};
use tokio::sync::mpsc;

/// Change notification sent to observers after every store mutation, in
/// exactly the order the mutations happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Appended(TurnId),
    Updated(TurnId),
    Finalized(TurnId),
    RolledBack(TurnId),
}

impl StoreEvent {
    pub fn turn_id(self) -> TurnId {
        match self {
            Self::Appended(id) | Self::Updated(id) | Self::Finalized(id) | Self::RolledBack(id) => {
                id
            }
        }
    }
}

/// Ordered, append-only transcript. Insertion order is chronological order.
pub struct ConversationStore {
    pub(super) turns: Vec<Turn>,
    pub(super) next_id: u64,
    pub(super) active: Option<TurnId>,
    pub(super) splitter: ThinkingSplitter,
    pub(super) observers: Vec<mpsc::UnboundedSender<StoreEvent>>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(ThinkingSplitter::default())
    }
}

impl ConversationStore {
    pub fn new(splitter: ThinkingSplitter) -> Self {
        Self {
            turns: Vec::new(),
            next_id: 1,
            active: None,
            splitter,
            observers: Vec::new(),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().find(|turn| turn.id() == id)
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn active_id(&self) -> Option<TurnId> {
        self.active
    }

    pub fn active_turn(&self) -> Option<&Turn> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn is_active(&self, id: TurnId) -> bool {
        self.active == Some(id)
    }

    pub fn splitter(&self) -> &ThinkingSplitter {
        &self.splitter
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    pub(super) fn allocate_id(&mut self) -> TurnId {
        let id = TurnId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub(super) fn active_index(&self) -> Option<usize> {
        let active = self.active?;
        self.turns.iter().rposition(|turn| turn.id() == active)
    }

    pub(super) fn emit(&mut self, event: StoreEvent) {
        self.observers.retain(|tx| tx.send(event).is_ok());
    }
}
