//! Subcommand implementations.

pub mod cart;
pub mod nav;
pub mod session;
pub mod team;
