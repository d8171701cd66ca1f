//! Storage module
//!
//! Provides durable key-value storage for the persisted collections.

pub mod kv_store;

pub use kv_store::{FileStore, KeyValueStore, MemoryStore};
