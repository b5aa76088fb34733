//! Shopping cart lines and merge rules.
//!
//! A cart is an ordered list of lines. Two lines are the same line iff their
//! product, selected size and selected colour all match; adding to an
//! existing line increases its quantity instead of appending.

use serde::{Deserialize, Serialize};

use super::{CartLineId, ProductId};

/// Errors that can occur when building a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantity was zero or negative.
    #[error("quantity must be at least 1")]
    NotPositive,
    /// Quantity does not fit the storage type.
    #[error("quantity is too large")]
    TooLarge,
}

/// A strictly positive item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity a single line can hold (fits a `PostgreSQL` `INTEGER`).
    pub const MAX: u32 = i32::MAX.unsigned_abs();

    /// One item.
    pub const ONE: Self = Self(1);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for zero and
    /// [`QuantityError::TooLarge`] above [`Quantity::MAX`].
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 {
            Err(QuantityError::NotPositive)
        } else if value > Self::MAX {
            Err(QuantityError::TooLarge)
        } else {
            Ok(Self(value))
        }
    }

    /// The count as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Add two quantities, failing instead of wrapping.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) if sum <= Self::MAX => Some(Self(sum)),
            _ => None,
        }
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(QuantityError::NotPositive);
        }
        let value = u32::try_from(value).map_err(|_| QuantityError::TooLarge)?;
        Self::new(value)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        // MAX fits i32
        Self::try_from(quantity.0).unwrap_or(Self::MAX)
    }
}

/// Errors raised by cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Merging would push a line past [`Quantity::MAX`].
    #[error("quantity for product {product_id} would exceed the maximum")]
    QuantityOverflow {
        /// Product of the line that overflowed.
        product_id: ProductId,
    },
}

/// A request to put some quantity of a product variant in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
    pub product_id: ProductId,
    pub selected_size: String,
    pub selected_color: String,
    pub quantity: Quantity,
}

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub selected_size: String,
    pub selected_color: String,
    pub quantity: Quantity,
}

impl CartItem {
    fn matches(&self, line: &NewCartLine) -> bool {
        self.product_id == line.product_id
            && self.selected_size == line.selected_size
            && self.selected_color == line.selected_color
    }
}

/// A user's cart, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Wrap lines loaded from storage.
    #[must_use]
    pub const fn from_items(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Consume the cart and return its lines.
    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Find a line by id.
    #[must_use]
    pub fn get(&self, id: CartLineId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Add a line, merging into an existing line with the same product, size
    /// and colour.
    ///
    /// Returns the id of the line that now holds the quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] if the merged quantity would
    /// exceed [`Quantity::MAX`]; the cart is left unchanged.
    pub fn add(&mut self, line: NewCartLine) -> Result<CartLineId, CartError> {
        if let Some(existing) = self.items.iter_mut().find(|item| item.matches(&line)) {
            existing.quantity = existing.quantity.checked_add(line.quantity).ok_or(
                CartError::QuantityOverflow {
                    product_id: line.product_id,
                },
            )?;
            return Ok(existing.id);
        }

        let id = CartLineId::generate();
        self.items.push(CartItem {
            id,
            product_id: line.product_id,
            selected_size: line.selected_size,
            selected_color: line.selected_color,
            quantity: line.quantity,
        });
        Ok(id)
    }

    /// Remove the line with the given id. Returns whether a line was removed.
    pub fn remove(&mut self, id: CartLineId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn line(product: i32, size: &str, color: &str, quantity: u32) -> NewCartLine {
        NewCartLine {
            product_id: ProductId::new(product),
            selected_size: size.to_owned(),
            selected_color: color.to_owned(),
            quantity: Quantity::new(quantity).unwrap(),
        }
    }

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive));
        assert_eq!(Quantity::try_from(-3_i64), Err(QuantityError::NotPositive));
        assert_eq!(
            Quantity::try_from(i64::from(u32::MAX)),
            Err(QuantityError::TooLarge)
        );
        assert_eq!(Quantity::new(5).unwrap().get(), 5);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert!(serde_json::from_str::<Quantity>("-1").is_err());
    }

    #[test]
    fn test_merge_scenario() {
        let mut cart = Cart::new();
        let first = cart.add(line(1, "M", "red", 2)).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity.get(), 2);

        let merged = cart.add(line(1, "M", "red", 3)).unwrap();
        assert_eq!(merged, first);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity.get(), 5);

        cart.add(line(1, "L", "red", 1)).unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total_quantity(), 6);
    }

    #[test]
    fn test_colour_is_part_of_key() {
        let mut cart = Cart::new();
        cart.add(line(1, "M", "red", 1)).unwrap();
        cart.add(line(1, "M", "blue", 1)).unwrap();
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_overflow_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add(line(1, "M", "red", Quantity::MAX)).unwrap();
        let before = cart.clone();
        let err = cart.add(line(1, "M", "red", 1)).unwrap_err();
        assert_eq!(
            err,
            CartError::QuantityOverflow {
                product_id: ProductId::new(1)
            }
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = Cart::new();
        cart.add(line(1, "M", "red", 1)).unwrap();
        assert!(!cart.remove(CartLineId::generate()));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut cart = Cart::new();
        cart.add(line(9, "S", "black", 1)).unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json[0]["productId"], 9);
        assert_eq!(json[0]["selectedSize"], "S");
        assert_eq!(json[0]["selectedColor"], "black");
        assert_eq!(json[0]["quantity"], 1);
    }

    proptest! {
        #[test]
        fn prop_split_adds_equal_single_add(a in 1u32..10_000, b in 1u32..10_000) {
            let mut split = Cart::new();
            split.add(line(1, "M", "red", a)).unwrap();
            split.add(line(1, "M", "red", b)).unwrap();

            let mut single = Cart::new();
            single.add(line(1, "M", "red", a + b)).unwrap();

            prop_assert_eq!(split.len(), 1);
            prop_assert_eq!(split.items()[0].quantity, single.items()[0].quantity);
        }

        #[test]
        fn prop_add_order_does_not_change_totals(
            adds in prop::collection::vec((1i32..4, 0usize..3, 1u32..50), 1..20)
        ) {
            let sizes = ["S", "M", "L"];
            let lines: Vec<NewCartLine> = adds
                .iter()
                .map(|(product, size, qty)| line(*product, sizes[*size], "red", *qty))
                .collect();

            let mut forward = Cart::new();
            for l in lines.iter().cloned() {
                forward.add(l).unwrap();
            }
            let mut backward = Cart::new();
            for l in lines.iter().rev().cloned() {
                backward.add(l).unwrap();
            }

            prop_assert_eq!(forward.len(), backward.len());
            prop_assert_eq!(forward.total_quantity(), backward.total_quantity());
            for item in forward.items() {
                let twin = backward.items().iter().find(|other| {
                    other.product_id == item.product_id
                        && other.selected_size == item.selected_size
                        && other.selected_color == item.selected_color
                });
                prop_assert_eq!(twin.map(|t| t.quantity), Some(item.quantity));
            }
        }

        #[test]
        fn prop_remove_is_idempotent(count in 1usize..8, pick in 0usize..8) {
            let mut cart = Cart::new();
            for i in 0..count {
                cart.add(line(i32::try_from(i).unwrap(), "M", "red", 1)).unwrap();
            }
            let target = cart.items()[pick % count].id;

            let mut once = cart.clone();
            once.remove(target);
            let mut twice = cart.clone();
            twice.remove(target);
            twice.remove(target);

            prop_assert_eq!(once, twice);
        }
    }
}
