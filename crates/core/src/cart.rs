//! Cart state, line identity and the cart reducer.
//!
//! A cart is an ordered list of lines. A line is identified by the tuple
//! (product id, selected size, selected color), so the same product in two
//! sizes occupies two lines. The cart total is never maintained
//! incrementally: every accepted action recomputes it from the lines.
//!
//! # Example
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use tienda_core::{CartAction, CartState, Product, ProductId};
//!
//! let shirt = Product::new(ProductId::new(1), "Remera", Decimal::new(1500, 2));
//! let mut cart = CartState::default();
//!
//! cart.apply(CartAction::add(shirt.clone(), 2, Some("M".into()), None));
//! cart.apply(CartAction::add(shirt, 1, Some("M".into()), None));
//!
//! assert_eq!(cart.items().len(), 1);
//! assert_eq!(cart.total(), Decimal::new(4500, 2));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId};

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartLineKey {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartLineKey {
    #[must_use]
    pub const fn new(product_id: ProductId, size: Option<String>, color: Option<String>) -> Self {
        Self {
            product_id,
            size,
            color,
        }
    }
}

/// One line in the cart: a product snapshot plus quantity and variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
}

impl CartItem {
    /// The identity tuple of this line.
    #[must_use]
    pub fn key(&self) -> CartLineKey {
        CartLineKey::new(
            self.product.id,
            self.selected_size.clone(),
            self.selected_color.clone(),
        )
    }

    /// Whether this line has the given identity.
    #[must_use]
    pub fn matches(&self, key: &CartLineKey) -> bool {
        self.product.id == key.product_id
            && self.selected_size == key.size
            && self.selected_color == key.color
    }

    /// Unit price times quantity, or `None` if it does not fit a `Decimal`.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.product.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Sum of `price * quantity` over the given lines, or `None` on overflow.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.line_total()?))
}

/// A command against the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add `quantity` of a product variant, merging with an existing line.
    AddItem {
        product: Product,
        quantity: u32,
        size: Option<String>,
        color: Option<String>,
    },
    /// Remove every line with this identity.
    RemoveItem(CartLineKey),
    /// Replace a line's quantity; zero removes the line.
    UpdateQuantity { key: CartLineKey, quantity: u32 },
    /// Remove all lines.
    Clear,
    /// Flip the cart panel's visibility.
    Toggle,
    /// Show the cart panel.
    Open,
    /// Hide the cart panel.
    Close,
}

impl CartAction {
    /// Shorthand for [`CartAction::AddItem`].
    #[must_use]
    pub const fn add(
        product: Product,
        quantity: u32,
        size: Option<String>,
        color: Option<String>,
    ) -> Self {
        Self::AddItem {
            product,
            quantity,
            size,
            color,
        }
    }

    /// Whether this action can change the cart lines (and so must be persisted).
    #[must_use]
    pub const fn touches_items(&self) -> bool {
        matches!(
            self,
            Self::AddItem { .. } | Self::RemoveItem(_) | Self::UpdateQuantity { .. } | Self::Clear
        )
    }
}

/// Outcome of applying a [`CartAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The action was carried out (possibly as a no-op when nothing matched).
    Accepted,
    /// The action was refused and the cart is untouched: zero units were
    /// added, or the resulting total would not fit a `Decimal`.
    Rejected,
}

/// The cart: ordered lines, panel visibility and the derived total.
///
/// Fields are private so the total can only change through [`CartState::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartState {
    items: Vec<CartItem>,
    is_open: bool,
    total: Decimal,
}

impl CartState {
    /// Rebuild a cart from a persisted snapshot.
    ///
    /// The stored total is ignored and recomputed; zero-quantity lines are
    /// dropped and lines sharing an identity are merged. The panel starts closed.
    /// Returns `None` if the recomputed total does not fit a `Decimal`.
    #[must_use]
    pub fn from_snapshot(snapshot: CartSnapshot) -> Option<Self> {
        let mut items: Vec<CartItem> = Vec::with_capacity(snapshot.items.len());
        for item in snapshot.items.into_iter().filter(|item| item.quantity > 0) {
            let key = item.key();
            match items.iter_mut().find(|existing| existing.matches(&key)) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => items.push(item),
            }
        }

        let total = cart_total(&items)?;
        Some(Self {
            items,
            is_open: false,
            total,
        })
    }

    /// The persisted form of this cart.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            total: self.total,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn find(&self, key: &CartLineKey) -> Option<&CartItem> {
        self.items.iter().find(|item| item.matches(key))
    }

    /// Apply an action.
    ///
    /// Line changes are made on a copy and committed only if the new total
    /// fits a `Decimal`; otherwise the action is rejected and the cart
    /// (including panel visibility) is untouched. Adding zero units is also
    /// rejected. Removing or updating a line that does not exist is a no-op.
    pub fn apply(&mut self, action: CartAction) -> Applied {
        let opens = matches!(action, CartAction::AddItem { .. });
        let items = match action {
            CartAction::Toggle => {
                self.is_open = !self.is_open;
                return Applied::Accepted;
            }
            CartAction::Open => {
                self.is_open = true;
                return Applied::Accepted;
            }
            CartAction::Close => {
                self.is_open = false;
                return Applied::Accepted;
            }
            CartAction::AddItem { quantity: 0, .. } => return Applied::Rejected,
            CartAction::AddItem {
                product,
                quantity,
                size,
                color,
            } => {
                let key = CartLineKey::new(product.id, size, color);
                let mut items = self.items.clone();
                match items.iter_mut().find(|item| item.matches(&key)) {
                    Some(item) => item.quantity = item.quantity.saturating_add(quantity),
                    None => items.push(CartItem {
                        product,
                        quantity,
                        selected_size: key.size,
                        selected_color: key.color,
                    }),
                }
                items
            }
            CartAction::RemoveItem(key) | CartAction::UpdateQuantity { key, quantity: 0 } => self
                .items
                .iter()
                .filter(|item| !item.matches(&key))
                .cloned()
                .collect(),
            CartAction::UpdateQuantity { key, quantity } => {
                let mut items = self.items.clone();
                if let Some(item) = items.iter_mut().find(|item| item.matches(&key)) {
                    item.quantity = quantity;
                }
                items
            }
            CartAction::Clear => Vec::new(),
        };

        let Some(total) = cart_total(&items) else {
            return Applied::Rejected;
        };
        self.items = items;
        self.total = total;
        if opens {
            self.is_open = true;
        }
        Applied::Accepted
    }
}

/// Persisted cart shape: the lines plus the total as a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn assert_close(value: &serde_json::Value, expected: f64) {
        let actual = value.as_f64().unwrap();
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    fn product(id: i64, cents: i64) -> Product {
        Product::new(ProductId::new(id), format!("Producto {id}"), Decimal::new(cents, 2))
    }

    fn key(id: i64, size: Option<&str>, color: Option<&str>) -> CartLineKey {
        CartLineKey::new(
            ProductId::new(id),
            size.map(str::to_string),
            color.map(str::to_string),
        )
    }

    fn assert_total_consistent(cart: &CartState) {
        assert_eq!(Some(cart.total()), cart_total(cart.items()));
        assert!(cart.items().iter().all(|item| item.quantity > 0));
    }

    #[test]
    fn test_add_same_identity_merges() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 1000), 2, Some("M".into()), Some("rojo".into())));
        cart.apply(CartAction::add(product(1, 1000), 3, Some("M".into()), Some("rojo".into())));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.total(), Decimal::new(5000, 2));
    }

    #[test]
    fn test_add_different_variant_is_distinct_row() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 1000), 1, Some("M".into()), None));
        cart.apply(CartAction::add(product(1, 1000), 1, Some("L".into()), None));
        cart.apply(CartAction::add(product(1, 1000), 1, Some("L".into()), Some("azul".into())));
        cart.apply(CartAction::add(product(1, 1000), 1, None, None));

        assert_eq!(cart.items().len(), 4);
        assert_eq!(cart.total(), Decimal::new(4000, 2));
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(3, 100), 1, None, None));
        cart.apply(CartAction::add(product(1, 100), 1, None, None));
        cart.apply(CartAction::add(product(2, 100), 1, None, None));
        cart.apply(CartAction::add(product(3, 100), 1, None, None));

        let ids: Vec<i64> = cart.items().iter().map(|i| i.product.id.as_i64()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_add_opens_cart() {
        let mut cart = CartState::default();
        assert!(!cart.is_open());
        cart.apply(CartAction::add(product(1, 100), 1, None, None));
        assert!(cart.is_open());
    }

    #[test]
    fn test_add_zero_is_rejected() {
        let mut cart = CartState::default();
        assert_eq!(
            cart.apply(CartAction::add(product(1, 100), 0, None, None)),
            Applied::Rejected
        );
        assert!(cart.is_empty());
        assert!(!cart.is_open());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_add_saturates() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 1), u32::MAX, None, None));
        cart.apply(CartAction::add(product(1, 1), 5, None, None));
        assert_eq!(cart.items()[0].quantity, u32::MAX);
        assert_total_consistent(&cart);
    }

    #[test]
    fn test_update_quantity_replaces() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 250), 4, None, None));
        cart.apply(CartAction::UpdateQuantity {
            key: key(1, None, None),
            quantity: 2,
        });
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total(), Decimal::new(500, 2));
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 250), 4, Some("S".into()), None));
        cart.apply(CartAction::add(product(2, 100), 1, None, None));
        cart.apply(CartAction::UpdateQuantity {
            key: key(1, Some("S"), None),
            quantity: 0,
        });

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].product.id, ProductId::new(2));
        assert_eq!(cart.total(), Decimal::new(100, 2));
    }

    #[test]
    fn test_update_missing_line_is_noop() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 250), 4, None, None));
        let before = cart.clone();
        cart.apply(CartAction::UpdateQuantity {
            key: key(1, Some("XL"), None),
            quantity: 9,
        });
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_missing_identity_is_noop() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 250), 1, Some("M".into()), None));
        let before = cart.clone();

        cart.apply(CartAction::RemoveItem(key(1, Some("L"), None)));
        cart.apply(CartAction::RemoveItem(key(9, None, None)));

        assert_eq!(cart.items(), before.items());
        assert_eq!(cart.total(), before.total());
    }

    #[test]
    fn test_remove_only_matching_variant() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 100), 1, Some("M".into()), None));
        cart.apply(CartAction::add(product(1, 100), 1, Some("L".into()), None));
        cart.apply(CartAction::RemoveItem(key(1, Some("M"), None)));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].selected_size.as_deref(), Some("L"));
    }

    #[test]
    fn test_clear() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 100), 3, None, None));
        cart.apply(CartAction::add(product(2, 999), 1, None, None));
        cart.apply(CartAction::Clear);

        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);

        cart.apply(CartAction::Clear);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_toggle_does_not_touch_items() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 100), 3, None, None));
        let total = cart.total();

        cart.apply(CartAction::Toggle);
        assert!(!cart.is_open());
        cart.apply(CartAction::Toggle);
        assert!(cart.is_open());
        assert_eq!(cart.total(), total);
        assert_eq!(cart.items().len(), 1);
        assert!(!CartAction::Toggle.touches_items());
    }

    #[test]
    fn test_item_count() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 100), 3, None, None));
        cart.apply(CartAction::add(product(2, 100), 2, None, None));
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_total_invariant_over_operation_sequence() {
        // Deterministic pseudo-random walk over the cart operations.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move |bound: u64| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed % bound
        };
        let sizes = [None, Some("S"), Some("M")];
        let colors = [None, Some("negro")];

        let mut cart = CartState::default();
        for _ in 0..2_000 {
            let id = i64::try_from(next(4)).unwrap();
            let size = sizes[usize::try_from(next(3)).unwrap()];
            let color = colors[usize::try_from(next(2)).unwrap()];
            let quantity = u32::try_from(next(5)).unwrap();
            let action = match next(4) {
                0 | 1 => CartAction::add(
                    product(id, 100 + id * 37),
                    quantity,
                    size.map(str::to_string),
                    color.map(str::to_string),
                ),
                2 => CartAction::RemoveItem(key(id, size, color)),
                _ => CartAction::UpdateQuantity {
                    key: key(id, size, color),
                    quantity,
                },
            };
            cart.apply(action);
            assert_total_consistent(&cart);

            let unique: HashSet<CartLineKey> = cart.items().iter().map(CartItem::key).collect();
            assert_eq!(unique.len(), cart.items().len());
        }
    }

    #[test]
    fn test_from_snapshot_recomputes_total() {
        let snapshot = CartSnapshot {
            items: vec![
                CartItem {
                    product: product(1, 1000),
                    quantity: 2,
                    selected_size: None,
                    selected_color: None,
                },
                CartItem {
                    product: product(2, 500),
                    quantity: 0,
                    selected_size: None,
                    selected_color: None,
                },
                CartItem {
                    product: product(1, 1000),
                    quantity: 1,
                    selected_size: None,
                    selected_color: None,
                },
            ],
            total: Decimal::new(123_456, 2),
        };

        let cart = CartState::from_snapshot(snapshot).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total(), Decimal::new(3000, 2));
        assert!(!cart.is_open());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(7, 1999), 2, Some("M".into()), None));

        let value = serde_json::to_value(cart.snapshot()).unwrap();
        assert_close(&value["total"], 39.98);
        let item = &value["items"][0];
        assert_eq!(item["id"], serde_json::json!(7));
        assert_close(&item["price"], 19.99);
        assert_eq!(item["quantity"], serde_json::json!(2));
        assert_eq!(item["selectedSize"], serde_json::json!("M"));
        assert!(item.get("selectedColor").is_none());
    }

    #[test]
    fn test_snapshot_parses_browser_shape() {
        let json = r#"{
            "items": [
                {"id": 3, "name": "Buzo", "price": 45.5, "imageUrl": "buzo.jpg",
                 "quantity": 2, "selectedColor": "gris"}
            ],
            "total": 91
        }"#;
        let snapshot: CartSnapshot = serde_json::from_str(json).unwrap();
        let cart = CartState::from_snapshot(snapshot).unwrap();

        assert_eq!(cart.items()[0].product.image_url.as_deref(), Some("buzo.jpg"));
        assert_eq!(cart.items()[0].selected_color.as_deref(), Some("gris"));
        assert_eq!(cart.total(), Decimal::new(9100, 2));
    }

    #[test]
    fn test_add_overflowing_total_is_rejected() {
        let mut cart = CartState::default();
        cart.apply(CartAction::add(product(1, 100), 1, None, None));
        cart.apply(CartAction::Close);
        let before = cart.clone();

        let huge = Product::new(ProductId::new(2), "Lingote", Decimal::MAX);
        assert_eq!(
            cart.apply(CartAction::add(huge, 2, None, None)),
            Applied::Rejected
        );
        assert_eq!(cart, before);
        assert!(!cart.is_open());
    }

    #[test]
    fn test_update_overflowing_total_is_rejected() {
        let big = Product::new(ProductId::new(1), "Lingote", Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0));
        let mut cart = CartState::default();
        cart.apply(CartAction::add(big, 1, None, None));
        let before = cart.clone();

        let applied = cart.apply(CartAction::UpdateQuantity {
            key: key(1, None, None),
            quantity: u32::MAX,
        });

        assert_eq!(applied, Applied::Rejected);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_from_snapshot_overflow_is_none() {
        let snapshot: CartSnapshot = serde_json::from_str(
            r#"{"items":[{"id":1,"name":"x","price":1e20,"quantity":4000000000}],"total":0}"#,
        )
        .unwrap();
        assert!(CartState::from_snapshot(snapshot).is_none());
    }

    #[test]
    fn test_line_total_overflow() {
        let item = CartItem {
            product: Product::new(ProductId::new(1), "x", Decimal::MAX),
            quantity: 2,
            selected_size: None,
            selected_color: None,
        };
        assert_eq!(item.line_total(), None);
        assert_eq!(cart_total(&[item]), None);
    }
}
