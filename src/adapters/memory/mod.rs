//! In-memory storage adapters.

mod store;

pub use store::InMemoryStore;
