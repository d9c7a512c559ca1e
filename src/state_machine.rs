//! Core order state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

pub mod dialog;
mod effect;
pub mod event;
mod reply;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use reply::{Reply, SuggestedAction};
pub use state::OrderState;
pub use transition::{transition, TransitionResult};
