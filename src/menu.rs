//! Menu catalog
//!
//! Fixed mapping from selectable labels to prompt fragments and unit prices.
//! Built once at startup and shared read-only by every conversation.

use crate::quantity::MAX_PLATES;
use crate::state_machine::dialog::UNRECOGNIZED_ITEM_REPLY;
use crate::state_machine::SuggestedAction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Failed to read menu file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid menu file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Menu has no items")]
    Empty,
    #[error("Menu item has an empty label")]
    EmptyLabel,
    #[error("Duplicate menu label: {0}")]
    DuplicateLabel(String),
    #[error("Menu item {0} must have a positive price")]
    NonPositivePrice(String),
    #[error("Menu item {0} is priced too high to total {} plates", MAX_PLATES)]
    PriceTooLarge(String),
    #[error("Menu label collides with a reserved reply: {0}")]
    ReservedLabel(String),
}

/// A single orderable meal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Exact text the user sends (and the quick-reply value)
    pub label: String,
    /// Used in "How many plates of {fragment}"
    pub prompt_fragment: String,
    pub unit_price: Decimal,
}

impl MenuItem {
    pub fn new(
        label: impl Into<String>,
        prompt_fragment: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            label: label.into(),
            prompt_fragment: prompt_fragment.into(),
            unit_price,
        }
    }

    /// Button title, e.g. `Ugali + Beef @ 300ksh`
    pub fn title(&self) -> String {
        format!("{} @ {}ksh", self.label, self.unit_price.normalize())
    }
}

/// Read-only catalog of menu items, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuCatalog {
    items: Vec<MenuItem>,
}

impl MenuCatalog {
    /// Build a catalog, rejecting labels that could be confused with each
    /// other or with the rejection reply.
    pub fn new(items: Vec<MenuItem>) -> Result<Self, MenuError> {
        if items.is_empty() {
            return Err(MenuError::Empty);
        }

        // Prices carry one fractional digit so totals render as "600.0"
        let items: Vec<MenuItem> = items
            .into_iter()
            .map(|mut item| {
                item.unit_price.rescale(1);
                item
            })
            .collect();

        let mut seen = HashSet::new();
        for item in &items {
            if item.label.is_empty() {
                return Err(MenuError::EmptyLabel);
            }
            // Checked after rescaling: 0.04 rounds to 0.0
            if item.unit_price <= Decimal::ZERO {
                return Err(MenuError::NonPositivePrice(item.label.clone()));
            }
            if item
                .unit_price
                .checked_mul(Decimal::from(MAX_PLATES))
                .is_none()
            {
                return Err(MenuError::PriceTooLarge(item.label.clone()));
            }
            if item.label == UNRECOGNIZED_ITEM_REPLY {
                return Err(MenuError::ReservedLabel(item.label.clone()));
            }
            if !seen.insert(item.label.as_str()) {
                return Err(MenuError::DuplicateLabel(item.label.clone()));
            }
        }

        Ok(Self { items })
    }

    /// The Cafe Cammi lunch menu
    pub fn cafe_cammi() -> Self {
        Self {
            items: vec![
                MenuItem::new("Ugali + Beef", "Ugali Beef", Decimal::new(3000, 1)),
                MenuItem::new("Rice + Beef", "Rice Beef", Decimal::new(2500, 1)),
                MenuItem::new("Rice + Beans", "Rice Beans", Decimal::new(2000, 1)),
            ],
        }
    }

    /// Load a catalog from a JSON array of items
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MenuError> {
        let raw = std::fs::read_to_string(path)?;
        let items: Vec<MenuItem> = serde_json::from_str(&raw)?;
        Self::new(items)
    }

    /// Exact, case-sensitive lookup
    pub fn lookup(&self, label: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.label == label)
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Quick replies offering every item
    pub fn suggested_actions(&self) -> Vec<SuggestedAction> {
        self.items
            .iter()
            .map(|item| SuggestedAction {
                title: item.title(),
                value: item.label.clone(),
            })
            .collect()
    }
}

impl Default for MenuCatalog {
    fn default() -> Self {
        Self::cafe_cammi()
    }
}
