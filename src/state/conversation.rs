mod core;
mod state;


pub use state::{ConversationStore, StoreEvent};
