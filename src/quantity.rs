//! Quantity parsing and bounds checking

use thiserror::Error;

/// Most plates a single order may contain
pub const MAX_PLATES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity is not a whole number")]
    NotANumber,
    #[error("quantity exceeds the maximum of {}", MAX_PLATES)]
    ExceedsMaximum,
    #[error("quantity must be at least one")]
    NotPositive,
}

/// Parse a base-10 plate count in `1..=MAX_PLATES`.
///
/// Accepts an optional sign but no surrounding whitespace. Values that do
/// not fit in an `i32` are treated as unparseable rather than too large.
pub fn validate(text: &str) -> Result<u32, QuantityError> {
    let parsed: i32 = text.parse().map_err(|_| QuantityError::NotANumber)?;

    match u32::try_from(parsed) {
        Ok(0) | Err(_) => Err(QuantityError::NotPositive),
        Ok(q) if q > MAX_PLATES => Err(QuantityError::ExceedsMaximum),
        Ok(q) => Ok(q),
    }
}
