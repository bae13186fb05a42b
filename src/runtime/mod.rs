pub mod context;
pub mod frontend;
pub mod r#loop;
pub mod mode;

use crate::state::{StoreEvent, SubmitOutcome};

/// Everything the view reacts to while the event loop runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    /// A mutation of the conversation store.
    Store(StoreEvent),
    /// A submission returned.
    TurnComplete(SubmitOutcome),
    /// A submission aborted on an internal fault.
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_client::MockTransport;
    use crate::runtime::{
        context::RuntimeContext,
        frontend::{FrontendAdapter, UserInputEvent},
        mode::RuntimeMode,
    };

    #[test]
    fn runtime_traits_accept_minimal_implementations() {
        struct DummyMode;
        impl RuntimeMode for DummyMode {
            fn on_user_input<T: crate::api::ChatTransport>(
                &mut self,
                _input: String,
                _ctx: &mut RuntimeContext<T>,
            ) {
            }
            fn on_model_update<T: crate::api::ChatTransport>(
                &mut self,
                _update: UiUpdate,
                _ctx: &mut RuntimeContext<T>,
            ) {
            }
            fn is_turn_in_progress(&self) -> bool {
                false
            }
        }

        struct DummyFrontend;
        impl FrontendAdapter<DummyMode> for DummyFrontend {
            fn poll_user_input(&mut self, _mode: &DummyMode) -> Option<UserInputEvent> {
                None
            }
            fn render(&mut self, _mode: &DummyMode) {}
            fn should_quit(&self) -> bool {
                true
            }
        }

        fn _uses_mode<M: RuntimeMode>() {}
        fn _uses_frontend<M: RuntimeMode, F: FrontendAdapter<M>>() {}
        _uses_mode::<DummyMode>();
        _uses_frontend::<DummyMode, DummyFrontend>();
        let _ = std::mem::size_of::<Option<RuntimeContext<MockTransport>>>();
    }
}
