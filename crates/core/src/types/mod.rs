//! Core types for Tienda.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod product;
pub mod role;

pub use id::*;
pub use product::Product;
pub use role::{ParseRoleError, Role, RoleSet, RolesColumn, normalize_roles};
