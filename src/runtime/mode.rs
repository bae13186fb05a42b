use crate::api::ChatTransport;
use crate::runtime::UiUpdate;

use super::context::RuntimeContext;
use super::frontend::UserInputEvent;

pub trait RuntimeMode {
    fn on_user_input<T: ChatTransport>(&mut self, input: String, ctx: &mut RuntimeContext<T>);
    fn on_model_update<T: ChatTransport>(&mut self, update: UiUpdate, ctx: &mut RuntimeContext<T>);
    fn on_interrupt<T: ChatTransport>(&mut self, _ctx: &mut RuntimeContext<T>) {}

    /// Routes a frontend event. Modes override this for events beyond text
    /// and interrupts.
    fn on_frontend_event<T: ChatTransport>(
        &mut self,
        event: UserInputEvent,
        ctx: &mut RuntimeContext<T>,
    ) {
        match event {
            UserInputEvent::Text(input) => self.on_user_input(input, ctx),
            UserInputEvent::Interrupt => self.on_interrupt(ctx),
            _ => {}
        }
    }

    fn is_turn_in_progress(&self) -> bool;
}
