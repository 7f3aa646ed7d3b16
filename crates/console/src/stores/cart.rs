//! Cart store: the cart reducer plus durable persistence.
//!
//! Every action that can change the lines writes the full snapshot to the
//! key-value store under [`storage_keys::CART`]. The in-memory cart is
//! updated first; a failed write is returned to the caller (and logged) but
//! never rolls the cart back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use tienda_core::{Applied, CartAction, CartLineKey, CartSnapshot, CartState, Product, ProductId};

use crate::models::storage_keys;
use crate::storage::{KeyValueStore, StorageError};

/// Version written into persisted snapshots.
const SNAPSHOT_VERSION: u32 = 0;

/// Envelope around the persisted cart: `{"state": {...}, "version": 0}`.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCart {
    state: CartSnapshot,
    #[serde(default)]
    version: u32,
}

/// The application's cart.
#[derive(Debug)]
pub struct CartStore<S> {
    state: CartState,
    storage: S,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Rehydrate the cart from `storage`, or start empty.
    ///
    /// A snapshot that cannot be read or parsed, or whose total does not fit
    /// a `Decimal`, is logged and ignored; the next mutation overwrites it.
    #[instrument(skip(storage))]
    pub fn load(storage: S) -> Self {
        let state = match storage.get(storage_keys::CART) {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedCart>(&raw) {
                Ok(persisted) if persisted.version == SNAPSHOT_VERSION => {
                    CartState::from_snapshot(persisted.state).unwrap_or_else(|| {
                        warn!("Ignoring cart snapshot whose total overflows");
                        CartState::default()
                    })
                }
                Ok(persisted) => {
                    warn!(version = persisted.version, "Ignoring cart snapshot with unknown version");
                    CartState::default()
                }
                Err(e) => {
                    warn!("Ignoring unreadable cart snapshot: {e}");
                    CartState::default()
                }
            },
            Ok(None) => CartState::default(),
            Err(e) => {
                warn!("Failed to read cart snapshot: {e}");
                CartState::default()
            }
        };

        debug!(lines = state.items().len(), "Cart loaded");
        Self { state, storage }
    }

    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.state.total()
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Apply an action and persist when it touched the lines.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot could not be written. The
    /// action has still been applied in memory.
    pub fn dispatch(&mut self, action: CartAction) -> Result<Applied, StorageError> {
        let persist = action.touches_items();
        let applied = self.state.apply(action);

        if applied == Applied::Rejected {
            warn!("Rejected cart action: zero quantity or total overflow");
            return Ok(applied);
        }

        if persist {
            self.persist().inspect_err(|e| warn!("Failed to persist cart: {e}"))?;
        }
        Ok(applied)
    }

    /// Add `quantity` units of a product variant. Opens the cart.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot could not be written.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(
        &mut self,
        product: Product,
        quantity: u32,
        size: Option<String>,
        color: Option<String>,
    ) -> Result<Applied, StorageError> {
        self.dispatch(CartAction::add(product, quantity, size, color))
    }

    /// Remove the line with this identity, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot could not be written.
    #[instrument(skip(self))]
    pub fn remove_item(
        &mut self,
        product_id: ProductId,
        size: Option<String>,
        color: Option<String>,
    ) -> Result<(), StorageError> {
        self.dispatch(CartAction::RemoveItem(CartLineKey::new(product_id, size, color)))
            .map(drop)
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// Returns `Applied::Rejected` if the new total would overflow.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot could not be written.
    #[instrument(skip(self))]
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        size: Option<String>,
        color: Option<String>,
    ) -> Result<Applied, StorageError> {
        self.dispatch(CartAction::UpdateQuantity {
            key: CartLineKey::new(product_id, size, color),
            quantity,
        })
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot could not be written.
    #[instrument(skip(self))]
    pub fn clear_cart(&mut self) -> Result<(), StorageError> {
        self.dispatch(CartAction::Clear).map(drop)
    }

    /// Flip the cart panel's visibility. Not persisted.
    pub fn toggle_cart(&mut self) {
        self.state.apply(CartAction::Toggle);
    }

    pub fn open_cart(&mut self) {
        self.state.apply(CartAction::Open);
    }

    pub fn close_cart(&mut self) {
        self.state.apply(CartAction::Close);
    }

    fn persist(&self) -> Result<(), StorageError> {
        let envelope = PersistedCart {
            state: self.state.snapshot(),
            version: SNAPSHOT_VERSION,
        };
        let raw = serde_json::to_string(&envelope)?;
        self.storage.set(storage_keys::CART, &raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStore;

    /// Store whose writes always fail.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn remera() -> Product {
        Product::new(ProductId::new(10), "Remera", Decimal::new(1250, 2))
    }

    fn persisted(storage: &MemoryStore) -> serde_json::Value {
        serde_json::from_str(&storage.get(storage_keys::CART).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn test_mutations_persist_envelope() {
        let storage = Arc::new(MemoryStore::new());
        let mut cart = CartStore::load(Arc::clone(&storage));

        cart.add_item(remera(), 2, Some("M".into()), None).unwrap();

        let value = persisted(&storage);
        assert_eq!(value["version"], serde_json::json!(0));
        assert_eq!(value["state"]["items"][0]["quantity"], serde_json::json!(2));
        assert_eq!(value["state"]["items"][0]["selectedSize"], serde_json::json!("M"));
        assert!(value["state"].get("isOpen").is_none());
    }

    #[test]
    fn test_state_survives_reload() {
        let storage = Arc::new(MemoryStore::new());
        {
            let mut cart = CartStore::load(Arc::clone(&storage));
            cart.add_item(remera(), 2, None, Some("blanco".into())).unwrap();
            cart.add_item(remera(), 1, None, None).unwrap();
            cart.update_quantity(ProductId::new(10), 5, None, None).unwrap();
        }

        let cart = CartStore::load(Arc::clone(&storage));
        assert_eq!(cart.state().items().len(), 2);
        assert_eq!(cart.state().items()[1].quantity, 5);
        assert_eq!(cart.total(), Decimal::new(8750, 2));
        assert!(!cart.is_open());
    }

    #[test]
    fn test_clear_persists_empty_snapshot() {
        let storage = Arc::new(MemoryStore::new());
        let mut cart = CartStore::load(Arc::clone(&storage));
        cart.add_item(remera(), 2, None, None).unwrap();
        cart.clear_cart().unwrap();

        let value = persisted(&storage);
        assert_eq!(value["state"]["items"], serde_json::json!([]));
        assert_eq!(value["state"]["total"].as_f64(), Some(0.0));
    }

    #[test]
    fn test_toggle_does_not_persist() {
        let storage = Arc::new(MemoryStore::new());
        let mut cart = CartStore::load(Arc::clone(&storage));
        cart.toggle_cart();
        assert!(cart.is_open());
        cart.close_cart();
        assert!(!cart.is_open());
        cart.open_cart();
        assert!(cart.is_open());
        assert_eq!(storage.get(storage_keys::CART).unwrap(), None);
    }

    #[test]
    fn test_rejected_add_does_not_persist() {
        let storage = Arc::new(MemoryStore::new());
        let mut cart = CartStore::load(Arc::clone(&storage));
        assert_eq!(cart.add_item(remera(), 0, None, None).unwrap(), Applied::Rejected);
        assert_eq!(storage.get(storage_keys::CART).unwrap(), None);
        assert!(!cart.is_open());
    }

    #[test]
    fn test_failed_write_keeps_memory_state() {
        let mut cart = CartStore::load(BrokenStore);
        let result = cart.add_item(remera(), 3, None, None);

        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(cart.state().items().len(), 1);
        assert_eq!(cart.total(), Decimal::new(3750, 2));
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(storage_keys::CART, "{not json").unwrap();
        let cart = CartStore::load(Arc::clone(&storage));
        assert!(cart.state().is_empty());
    }

    #[test]
    fn test_unknown_version_starts_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(
                storage_keys::CART,
                r#"{"state":{"items":[{"id":1,"name":"x","price":1,"quantity":1}],"total":1},"version":9}"#,
            )
            .unwrap();
        let cart = CartStore::load(Arc::clone(&storage));
        assert!(cart.state().is_empty());
    }

    #[test]
    fn test_rehydrate_ignores_stored_total() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(
                storage_keys::CART,
                r#"{"state":{"items":[{"id":1,"name":"Buzo","price":20.5,"quantity":2}],"total":999},"version":0}"#,
            )
            .unwrap();
        let cart = CartStore::load(Arc::clone(&storage));
        assert_eq!(cart.total(), Decimal::new(4100, 2));
    }

    #[test]
    fn test_overflowing_snapshot_starts_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(
                storage_keys::CART,
                r#"{"state":{"items":[{"id":1,"name":"x","price":1e20,"quantity":4000000000}],"total":0},"version":0}"#,
            )
            .unwrap();

        let mut cart = CartStore::load(Arc::clone(&storage));
        assert!(cart.state().is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);

        cart.add_item(remera(), 1, None, None).unwrap();
        assert_eq!(persisted(&storage)["state"]["items"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_overflowing_add_is_rejected_and_not_persisted() {
        let storage = Arc::new(MemoryStore::new());
        let mut cart = CartStore::load(Arc::clone(&storage));
        cart.add_item(remera(), 1, None, None).unwrap();
        let before = persisted(&storage);

        let huge = Product::new(ProductId::new(99), "Lingote", Decimal::MAX);
        assert_eq!(cart.add_item(huge, 2, None, None).unwrap(), Applied::Rejected);

        assert_eq!(cart.state().items().len(), 1);
        assert_eq!(cart.total(), Decimal::new(1250, 2));
        assert_eq!(persisted(&storage), before);
    }
}
