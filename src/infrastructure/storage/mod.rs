//! Key-value storage adapters

mod json_file;
mod memory;

pub use json_file::{JsonFileStore, DATA_DIR_ENV};
pub use memory::MemoryStore;
