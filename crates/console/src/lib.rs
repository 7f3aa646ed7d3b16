//! Tienda Console - application layer for the admin console and storefront cart.
//!
//! # Architecture
//!
//! - [`stores`] hold the two pieces of process-wide state: the cart and the
//!   session. Both are owned by [`AppState`] and handed out by reference.
//! - [`storage`] is the durable key-value store the cart persists into.
//! - [`backend`] talks to the hosted auth/database service. Everything that
//!   needs it is generic over the [`backend::AuthProvider`] and
//!   [`backend::UserDirectory`] traits so tests can swap in fakes.
//! - [`team`] lists team members and edits their roles.
//! - [`navigation`] is the admin menu table shared by the menu and the route guard.
//!
//! Configuration comes from environment variables, see [`config`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod state;
pub mod storage;
pub mod stores;
pub mod team;

pub use config::ConsoleConfig;
pub use error::{AppError, Result};
pub use state::AppState;
