//! DeskPort Storage - Account-scoped datastore access
//!
//! This crate provides the datastore collaborator for DeskPort:
//! per-entity lookup and create operations plus transactional scoping,
//! with a PostgreSQL implementation and an in-memory implementation.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use models::*;
pub use postgres::PgStore;
pub use store::{AccountStore, ConversationFilter};
