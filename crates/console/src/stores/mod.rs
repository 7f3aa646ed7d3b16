//! Application state stores.
//!
//! - [`CartStore`] - cart lines, panel visibility, derived total; persisted
//! - [`SessionStore`] - current session and user profile; in memory only

pub mod cart;
pub mod session;

pub use cart::CartStore;
pub use session::SessionStore;
