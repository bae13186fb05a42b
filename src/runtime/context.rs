use crate::api::ChatTransport;
use crate::runtime::UiUpdate;
use crate::state::ChatSession;
use tokio::sync::mpsc;

/// Per-loop context passed into every `RuntimeMode` callback.
pub struct RuntimeContext<T: ChatTransport> {
    pub session: ChatSession<T>,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
}

impl<T: ChatTransport> RuntimeContext<T> {
    pub fn new(session: ChatSession<T>, update_tx: mpsc::UnboundedSender<UiUpdate>) -> Self {
        Self { session, update_tx }
    }

    /// Submit `input` on a background task. The outcome comes back as
    /// `UiUpdate::TurnComplete`, or `UiUpdate::Error` on a store fault.
    pub fn start_turn(&mut self, input: String) {
        let session = self.session.clone();
        let update_tx = self.update_tx.clone();
        tokio::spawn(async move {
            let update = match session.submit(&input).await {
                Ok(outcome) => UiUpdate::TurnComplete(outcome),
                Err(error) => {
                    tracing::error!(%error, "submission aborted");
                    UiUpdate::Error(error.to_string())
                }
            };
            let _ = update_tx.send(update);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_client::{MockResponse, MockTransport};
    use crate::state::{SubmitOutcome, ThinkingSplitter};

    #[tokio::test]
    async fn start_turn_reports_completion_through_update_channel() {
        let transport = MockTransport::new(vec![MockResponse::lines(&[r#"{"message":"Hi"}"#])]);
        let session = ChatSession::new(transport, "cle", ThinkingSplitter::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ctx = RuntimeContext::new(session, tx);

        ctx.start_turn("Hello".to_string());

        match rx.recv().await {
            Some(UiUpdate::TurnComplete(SubmitOutcome::Completed { stream_error, .. })) => {
                assert_eq!(stream_error, None);
            }
            other => panic!("unexpected update: {other:?}"),
        }
        let turns = ctx.session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].visible_response(), "Hi");
    }
}
