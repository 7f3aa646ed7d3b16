//! Integration tests for the persisted cart.
//!
//! These tests drive the cart through `AppState` on a real directory and
//! restart the state to check what survives.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;
use tienda_console::models::storage_keys;
use tienda_console::storage::{FileStore, KeyValueStore};
use tienda_core::{Applied, Product, ProductId};
use tienda_integration_tests::{FakeBackend, app_state, temp_storage_dir};

fn buzo() -> Product {
    Product::new(ProductId::new(7), "Buzo", Decimal::new(2500, 2))
}

fn media() -> Product {
    Product::new(ProductId::new(8), "Media", Decimal::new(399, 2))
}

// =============================================================================
// Line identity
// =============================================================================

#[test]
fn test_same_variant_merges_into_one_line() {
    let dir = temp_storage_dir();
    let mut state = app_state(&FakeBackend::new(), dir.path());

    let cart = state.cart_mut();
    cart.add_item(buzo(), 1, Some("L".into()), Some("gris".into())).unwrap();
    cart.add_item(buzo(), 2, Some("L".into()), Some("gris".into())).unwrap();

    assert_eq!(state.cart().state().items().len(), 1);
    assert_eq!(state.cart().state().items()[0].quantity, 3);
}

#[test]
fn test_different_variants_are_separate_lines() {
    let dir = temp_storage_dir();
    let mut state = app_state(&FakeBackend::new(), dir.path());

    let cart = state.cart_mut();
    cart.add_item(buzo(), 1, Some("L".into()), None).unwrap();
    cart.add_item(buzo(), 1, Some("M".into()), None).unwrap();
    cart.add_item(buzo(), 1, Some("M".into()), Some("negro".into())).unwrap();

    assert_eq!(state.cart().state().items().len(), 3);
    assert_eq!(state.cart().total(), Decimal::new(7500, 2));

    // Removing one variant leaves the others
    state
        .cart_mut()
        .remove_item(ProductId::new(7), Some("M".into()), None)
        .unwrap();
    assert_eq!(state.cart().state().items().len(), 2);
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_cart_survives_restart() {
    let dir = temp_storage_dir();
    let backend = FakeBackend::new();
    {
        let mut state = app_state(&backend, dir.path());
        let cart = state.cart_mut();
        cart.add_item(buzo(), 2, Some("S".into()), None).unwrap();
        cart.add_item(media(), 3, None, None).unwrap();
        cart.update_quantity(ProductId::new(8), 1, None, None).unwrap();
    }

    let state = app_state(&backend, dir.path());
    let cart = state.cart().state();
    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.items()[0].selected_size.as_deref(), Some("S"));
    assert_eq!(cart.items()[1].quantity, 1);
    assert_eq!(cart.total(), Decimal::new(5399, 2));
    assert!(!cart.is_open(), "panel visibility is not persisted");
}

#[test]
fn test_snapshot_file_shape() {
    let dir = temp_storage_dir();
    let mut state = app_state(&FakeBackend::new(), dir.path());
    state
        .cart_mut()
        .add_item(buzo(), 2, None, Some("gris".into()))
        .unwrap();

    let raw = FileStore::new(dir.path()).get(storage_keys::CART).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(value["version"], serde_json::json!(0));
    let item = &value["state"]["items"][0];
    assert_eq!(item["id"], serde_json::json!(7));
    assert_eq!(item["name"], serde_json::json!("Buzo"));
    assert_eq!(item["quantity"], serde_json::json!(2));
    assert_eq!(item["selectedColor"], serde_json::json!("gris"));
    assert!(item.get("selectedSize").is_none());
    assert!((value["state"]["total"].as_f64().unwrap() - 50.0).abs() < 1e-9);
}

#[test]
fn test_update_to_zero_removes_and_persists() {
    let dir = temp_storage_dir();
    let backend = FakeBackend::new();
    {
        let mut state = app_state(&backend, dir.path());
        state.cart_mut().add_item(media(), 4, None, None).unwrap();
        state
            .cart_mut()
            .update_quantity(ProductId::new(8), 0, None, None)
            .unwrap();
    }

    let state = app_state(&backend, dir.path());
    assert!(state.cart().state().is_empty());
    assert_eq!(state.cart().total(), Decimal::ZERO);
}

#[test]
fn test_zero_quantity_add_is_rejected() {
    let dir = temp_storage_dir();
    let mut state = app_state(&FakeBackend::new(), dir.path());

    let applied = state.cart_mut().add_item(media(), 0, None, None).unwrap();

    assert_eq!(applied, Applied::Rejected);
    assert!(state.cart().state().is_empty());
    assert!(!state.cart().is_open());
    assert_eq!(FileStore::new(dir.path()).get(storage_keys::CART).unwrap(), None);
}

#[test]
fn test_corrupt_file_starts_empty_and_is_overwritten() {
    let dir = temp_storage_dir();
    let store = FileStore::new(dir.path());
    store.set(storage_keys::CART, "not json").unwrap();

    let mut state = app_state(&FakeBackend::new(), dir.path());
    assert!(state.cart().state().is_empty());

    state.cart_mut().add_item(media(), 1, None, None).unwrap();
    let raw = store.get(storage_keys::CART).unwrap().unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&raw).is_ok());
}

#[test]
fn test_snapshot_with_overflowing_total_starts_empty() {
    let dir = temp_storage_dir();
    FileStore::new(dir.path())
        .set(
            storage_keys::CART,
            r#"{"state":{"items":[{"id":1,"name":"Lingote","price":1e20,"quantity":4000000000}],"total":0},"version":0}"#,
        )
        .unwrap();

    let state = app_state(&FakeBackend::new(), dir.path());
    assert!(state.cart().state().is_empty());
    assert_eq!(state.cart().total(), Decimal::ZERO);
}

#[test]
fn test_overflowing_add_leaves_cart_and_file_unchanged() {
    let dir = temp_storage_dir();
    let mut state = app_state(&FakeBackend::new(), dir.path());
    state.cart_mut().add_item(media(), 2, None, None).unwrap();
    let before = FileStore::new(dir.path()).get(storage_keys::CART).unwrap();

    let huge = Product::new(ProductId::new(99), "Lingote", Decimal::MAX);
    let applied = state.cart_mut().add_item(huge, 2, None, None).unwrap();

    assert_eq!(applied, Applied::Rejected);
    assert_eq!(state.cart().state().items().len(), 1);
    assert_eq!(FileStore::new(dir.path()).get(storage_keys::CART).unwrap(), before);
}

#[test]
fn test_clear_after_add_sequence() {
    let dir = temp_storage_dir();
    let backend = FakeBackend::new();
    {
        let mut state = app_state(&backend, dir.path());
        for id in 1..=5 {
            let product = Product::new(ProductId::new(id), "Producto", Decimal::new(100, 0));
            state.cart_mut().add_item(product, 1, None, None).unwrap();
        }
        assert_eq!(state.cart().total(), Decimal::new(500, 0));
        state.cart_mut().clear_cart().unwrap();
    }

    let state = app_state(&backend, dir.path());
    assert!(state.cart().state().is_empty());
}

#[test]
fn test_storage_dir_is_removed_after_test() {
    let dir = temp_storage_dir();
    let path = dir.path().to_path_buf();
    app_state(&FakeBackend::new(), dir.path())
        .cart_mut()
        .add_item(media(), 1, None, None)
        .unwrap();
    assert!(path.exists());

    drop(dir);
    assert!(!path.exists());
}
