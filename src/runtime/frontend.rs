use super::mode::RuntimeMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAction {
    LineUp,
    LineDown,
    PageUp(usize),
    PageDown(usize),
    Home,
    End,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserInputEvent {
    Text(String),
    Interrupt,
    /// `max_offset` is the largest top row the transcript can scroll to at
    /// the last rendered size.
    Scroll {
        action: ScrollAction,
        max_offset: usize,
    },
    ToggleThinking,
    CopyLastReply,
    DismissError,
}

pub trait FrontendAdapter<M: RuntimeMode> {
    fn poll_user_input(&mut self, mode: &M) -> Option<UserInputEvent>;
    fn render(&mut self, mode: &M);
    fn should_quit(&self) -> bool;
}
