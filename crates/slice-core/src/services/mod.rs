//! Business logic. Handlers in `controllers` stay thin adapters over these
//! functions, which take a connection (or transaction) and plain values.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
