pub mod accumulator;
pub mod conversation;
pub mod session;
pub mod thinking;
pub mod turn;

pub use accumulator::ContentAccumulator;
pub use conversation::{ConversationStore, StoreEvent};
pub use session::{ChatSession, SessionSnapshot, SubmitOutcome};
pub use thinking::{ThinkingSplit, ThinkingSplitter};
pub use turn::{Role, Turn, TurnId};
