//! Effects produced by state transitions

use super::reply::Reply;

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Record the user's text in the transcript
    PersistUserMessage { text: String },

    /// Persist the new state
    PersistState,

    /// Record a bot reply and deliver it to the user
    SendReply { reply: Reply },
}

impl Effect {
    pub fn persist_user_message(text: impl Into<String>) -> Self {
        Effect::PersistUserMessage { text: text.into() }
    }

    pub fn send_reply(reply: Reply) -> Self {
        Effect::SendReply { reply }
    }
}
