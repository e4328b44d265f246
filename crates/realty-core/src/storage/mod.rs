//! Storage layer.
//!
//! A sled database with one tree per collection.

mod config;
mod store;

pub use config::{StorageConfig, DATA_PATH_ENV, DEFAULT_DATA_PATH};
pub use store::{Insertion, RecordStore, Stored};
