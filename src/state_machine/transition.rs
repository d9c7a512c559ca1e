//! Pure state transition function
//!
//! Wraps the dialog in the event/effect shape the runtime executes.

use super::dialog::{handle_turn, welcome};
use super::{Effect, Event, OrderState};
use crate::menu::MenuCatalog;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: OrderState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: OrderState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Pure transition function
///
/// Every event is handled; there is no invalid transition. `PersistState` is
/// emitted exactly when the order changed, and always before any reply.
pub fn transition(state: &OrderState, menu: &MenuCatalog, event: Event) -> TransitionResult {
    match event {
        // Greeting never touches the order, even mid-order
        Event::ConversationStarted => TransitionResult::new(state.clone())
            .with_effects(welcome(menu).into_iter().map(Effect::send_reply)),

        Event::UserMessage { text } => {
            let outcome = handle_turn(state, &text, menu);

            if outcome.kind.is_rejection() {
                tracing::debug!(
                    stage = state.stage(),
                    kind = ?outcome.kind,
                    "Rejected user input"
                );
            }

            let mut result =
                TransitionResult::new(outcome.state).with_effect(Effect::persist_user_message(text));
            if result.new_state != *state {
                result = result.with_effect(Effect::PersistState);
            }
            result.with_effect(Effect::send_reply(outcome.reply))
        }
    }
}
