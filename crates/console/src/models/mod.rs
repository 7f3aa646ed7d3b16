//! Domain models for the console.
//!
//! Row types mirror the backend tables; domain types are what the rest of
//! the crate works with.

pub mod session;
pub mod user;

pub use session::{AuthSession, StoredToken, storage_keys};
pub use user::{UserProfile, UserRow};
