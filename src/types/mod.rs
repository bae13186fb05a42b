pub mod api;

pub use api::{ChatRequest, WireEvent};
