//! Monetary types for price and volume representation.

use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Volume represented as a Decimal for precision.
pub type Volume = Decimal;

/// Whether `price` is a valid limit price for an outcome token.
///
/// A binary outcome token pays out at most $1, so limit prices must lie
/// strictly between 0 and 1.
#[must_use]
pub fn is_valid_limit_price(price: Price) -> bool {
    price > Decimal::ZERO && price < Decimal::ONE
}
