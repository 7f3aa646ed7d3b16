//! Tienda Core - Shared types library.
//!
//! This crate provides the types and pure rules used across all Tienda components:
//! - `console` - Application layer (stores, backend client, team management)
//! - `cli` - Command-line front end driving the console
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. Everything here can be tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, roles, product snapshots
//! - [`cart`] - Cart line identity, the cart reducer and derived totals
//! - [`access`] - Route guard decisions and role-filtered navigation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod cart;
pub mod types;

pub use access::{AccessContext, GuardDecision, GuardRedirects, NavItem, guard, visible_nav};
pub use cart::{Applied, CartAction, CartItem, CartLineKey, CartSnapshot, CartState, cart_total};
pub use types::*;
