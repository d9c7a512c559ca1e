//! Conversation runtime executor

use super::traits::Storage;
use super::{QueuedEvent, SseEvent, TurnResult};

use crate::db::Direction;
use crate::menu::MenuCatalog;
use crate::state_machine::{transition, Effect, Event, OrderState, Reply, TransitionResult};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Runs one conversation: drains its event queue one turn at a time
pub struct ConversationRuntime<S>
where
    S: Storage + 'static,
{
    conv_id: String,
    /// Last successfully persisted order
    state: OrderState,
    menu: Arc<MenuCatalog>,
    storage: S,
    event_rx: mpsc::Receiver<QueuedEvent>,
    broadcast_tx: broadcast::Sender<SseEvent>,
}

impl<S> ConversationRuntime<S>
where
    S: Storage + 'static,
{
    pub fn new(
        conv_id: impl Into<String>,
        state: OrderState,
        menu: Arc<MenuCatalog>,
        storage: S,
        event_rx: mpsc::Receiver<QueuedEvent>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        Self {
            conv_id: conv_id.into(),
            state,
            menu,
            storage,
            event_rx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(conv_id = %self.conv_id, stage = self.state.stage(), "Starting conversation runtime");

        while let Some(QueuedEvent { event, respond_to }) = self.event_rx.recv().await {
            let result = self.process_event(event).await;

            if let Err(e) = &result {
                tracing::error!(conv_id = %self.conv_id, error = %e, "Turn dropped");
                let _ = self.broadcast_tx.send(SseEvent::Error { message: e.clone() });
            }
            let _ = self.broadcast_tx.send(SseEvent::TurnComplete);

            if let Some(tx) = respond_to {
                let _ = tx.send(result);
            }
        }

        tracing::info!(conv_id = %self.conv_id, "Conversation runtime stopped");
    }

    /// Decide, then persist and deliver. Stops at the first failed effect so
    /// a turn whose state could not be saved sends no reply.
    async fn process_event(&mut self, event: Event) -> TurnResult {
        let TransitionResult { new_state, effects } = transition(&self.state, &self.menu, event);

        let mut replies = Vec::new();
        for effect in effects {
            if let Some(reply) = self.execute_effect(effect, &new_state).await? {
                replies.push(reply);
            }
        }

        Ok(replies)
    }

    async fn execute_effect(
        &mut self,
        effect: Effect,
        new_state: &OrderState,
    ) -> Result<Option<Reply>, String> {
        match effect {
            Effect::PersistUserMessage { text } => {
                let msg = self
                    .storage
                    .add_message(&self.conv_id, Direction::User, &text, &[])
                    .await?;
                let _ = self.broadcast_tx.send(SseEvent::Message { message: msg });
                Ok(None)
            }

            Effect::PersistState => {
                self.storage.save_state(&self.conv_id, new_state).await?;
                self.state = new_state.clone();

                tracing::info!(
                    conv_id = %self.conv_id,
                    stage = self.state.stage(),
                    item = ?self.state.selected_item(),
                    quantity = self.state.quantity(),
                    "Order updated"
                );
                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    state: self.state.clone(),
                });
                Ok(None)
            }

            Effect::SendReply { reply } => {
                let msg = self
                    .storage
                    .add_message(
                        &self.conv_id,
                        Direction::Bot,
                        &reply.text,
                        &reply.suggested_actions,
                    )
                    .await?;
                let _ = self.broadcast_tx.send(SseEvent::Message { message: msg });
                Ok(Some(reply))
            }
        }
    }
}
