#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    HistoryRepository, InMemoryStore, KeyValueRepository, KeyValueStore, ProgressRepository,
    Storage, StorageError,
};
