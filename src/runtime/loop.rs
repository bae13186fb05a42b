use crate::api::ChatTransport;
use crate::runtime::UiUpdate;
use crate::state::StoreEvent;
use tokio::sync::mpsc;

use super::{context::RuntimeContext, frontend::FrontendAdapter, mode::RuntimeMode};

pub struct Runtime<M: RuntimeMode> {
    pub mode: M,
    update_rx: mpsc::UnboundedReceiver<UiUpdate>,
    store_rx: mpsc::UnboundedReceiver<StoreEvent>,
}

impl<M: RuntimeMode> Runtime<M> {
    pub fn new(
        mode: M,
        update_rx: mpsc::UnboundedReceiver<UiUpdate>,
        store_rx: mpsc::UnboundedReceiver<StoreEvent>,
    ) -> Self {
        Self {
            mode,
            update_rx,
            store_rx,
        }
    }

    pub async fn run<F, T>(&mut self, frontend: &mut F, ctx: &mut RuntimeContext<T>)
    where
        F: FrontendAdapter<M>,
        T: ChatTransport,
    {
        while !frontend.should_quit() {
            self.drain_updates(ctx);
            frontend.render(&self.mode);
            if let Some(event) = frontend.poll_user_input(&self.mode) {
                self.mode.on_frontend_event(event, ctx);
            }
            tokio::task::yield_now().await;
        }
        tracing::debug!("runtime loop exited");
    }

    /// Store events first, then submission results, so a completed turn is
    /// never reported before the mutations that produced it.
    pub fn drain_updates<T: ChatTransport>(&mut self, ctx: &mut RuntimeContext<T>) {
        while let Ok(event) = self.store_rx.try_recv() {
            self.mode.on_model_update(UiUpdate::Store(event), ctx);
        }
        while let Ok(update) = self.update_rx.try_recv() {
            self.mode.on_model_update(update, ctx);
        }
    }
}
