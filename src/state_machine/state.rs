//! Order state types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One in-progress order for one conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum OrderState {
    /// Nothing chosen yet
    #[default]
    AwaitingItem,

    /// An item has been chosen; waiting for a plate count.
    ///
    /// The stage never advances past this point: after a total is announced
    /// further input is still read as a quantity.
    AwaitingQuantity {
        item: String,
        unit_price: Decimal,
        /// 0 until a valid quantity has been entered
        #[serde(default)]
        quantity: u32,
    },
}

impl OrderState {
    pub fn selected(item: impl Into<String>, unit_price: Decimal) -> Self {
        OrderState::AwaitingQuantity {
            item: item.into(),
            unit_price,
            quantity: 0,
        }
    }

    /// Stage name as used in logs and state-change events
    pub fn stage(&self) -> &'static str {
        match self {
            OrderState::AwaitingItem => "awaiting_item",
            OrderState::AwaitingQuantity { .. } => "awaiting_quantity",
        }
    }

    pub fn selected_item(&self) -> Option<&str> {
        match self {
            OrderState::AwaitingItem => None,
            OrderState::AwaitingQuantity { item, .. } => Some(item),
        }
    }

    pub fn unit_price(&self) -> Decimal {
        match self {
            OrderState::AwaitingItem => Decimal::ZERO,
            OrderState::AwaitingQuantity { unit_price, .. } => *unit_price,
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            OrderState::AwaitingItem => 0,
            OrderState::AwaitingQuantity { quantity, .. } => *quantity,
        }
    }

    /// `unit_price * quantity`, never stored.
    ///
    /// Catalog prices are bounded so a full order cannot overflow; a state
    /// read back from storage is not, so this saturates instead of panicking.
    pub fn total(&self) -> Decimal {
        self.unit_price()
            .checked_mul(Decimal::from(self.quantity()))
            .unwrap_or(Decimal::MAX)
    }
}
