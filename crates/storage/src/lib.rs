//! Document storage for chirp
//!
//! This crate defines the user and post record types, the async store traits
//! the rest of the system is written against, and a sled-backed document
//! store implementation with per-document atomicity.

pub mod kv;
pub mod models;
pub mod store;

pub use kv::{KvConfig, SledStore};
pub use models::{Post, User};
pub use store::{PostStore, Result, StoreError, UserStore};
