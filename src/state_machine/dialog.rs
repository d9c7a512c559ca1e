//! Order dialog: the per-turn decision function
//!
//! Pure: given the current order and the user's text, decide the next order
//! and what to say. Rejected input never changes the order.

use super::reply::Reply;
use super::state::OrderState;
use crate::menu::MenuCatalog;
use crate::quantity::{self, QuantityError};

pub const WELCOME_MESSAGE: &str = "Welcome to Cafe Cammi.";
pub const MENU_PROMPT: &str = "What Would you Like to Order for today?";
pub const UNRECOGNIZED_ITEM_REPLY: &str = "Please select meal from the above choices";
pub const MAXIMUM_EXCEEDED_REPLY: &str = "We only serve a maximum of 3 plates";
pub const INVALID_QUANTITY_REPLY: &str = "Enter a valid quantity";

/// What kind of reply a turn produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    ItemSelected,
    TotalAnnounced,
    UnrecognizedItem,
    QuantityNotANumber,
    QuantityExceedsMaximum,
    QuantityNotPositive,
}

impl ReplyKind {
    /// Whether the input was rejected (and the order left as it was)
    pub fn is_rejection(self) -> bool {
        !matches!(self, ReplyKind::ItemSelected | ReplyKind::TotalAnnounced)
    }
}

impl From<QuantityError> for ReplyKind {
    fn from(err: QuantityError) -> Self {
        match err {
            QuantityError::NotANumber => ReplyKind::QuantityNotANumber,
            QuantityError::ExceedsMaximum => ReplyKind::QuantityExceedsMaximum,
            QuantityError::NotPositive => ReplyKind::QuantityNotPositive,
        }
    }
}

/// Result of one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub state: OrderState,
    pub reply: Reply,
    pub kind: ReplyKind,
}

/// Decide the next order and reply for one user message
pub fn handle_turn(state: &OrderState, text: &str, menu: &MenuCatalog) -> TurnOutcome {
    match state {
        OrderState::AwaitingItem => match menu.lookup(text) {
            Some(item) => TurnOutcome {
                state: OrderState::selected(&item.label, item.unit_price),
                reply: Reply::text(format!("How many plates of {}", item.prompt_fragment)),
                kind: ReplyKind::ItemSelected,
            },
            None => reject(state, ReplyKind::UnrecognizedItem, UNRECOGNIZED_ITEM_REPLY),
        },

        OrderState::AwaitingQuantity {
            item, unit_price, ..
        } => match quantity::validate(text) {
            Ok(quantity) => {
                let new_state = OrderState::AwaitingQuantity {
                    item: item.clone(),
                    unit_price: *unit_price,
                    quantity,
                };
                let reply = Reply::with_actions(
                    format!("Your total amount is: Ksh {}", new_state.total()),
                    menu.suggested_actions(),
                );
                TurnOutcome {
                    state: new_state,
                    reply,
                    kind: ReplyKind::TotalAnnounced,
                }
            }
            Err(QuantityError::ExceedsMaximum) => reject(
                state,
                ReplyKind::QuantityExceedsMaximum,
                MAXIMUM_EXCEEDED_REPLY,
            ),
            Err(err) => reject(state, err.into(), INVALID_QUANTITY_REPLY),
        },
    }
}

/// Greeting plus the menu, sent when a conversation starts
pub fn welcome(menu: &MenuCatalog) -> Vec<Reply> {
    vec![
        Reply::text(WELCOME_MESSAGE),
        Reply::with_actions(MENU_PROMPT, menu.suggested_actions()),
    ]
}

fn reject(state: &OrderState, kind: ReplyKind, text: &str) -> TurnOutcome {
    TurnOutcome {
        state: state.clone(),
        reply: Reply::text(text),
        kind,
    }
}
