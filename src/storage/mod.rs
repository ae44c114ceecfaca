//! # Storage Module - Key-Value Persistence Layer
//!
//! The minigame core never talks to a database directly. Hosts hand it a
//! [`KvStore`]: an asynchronous string-keyed byte store with `get` and `put`.
//! Keys are `"{platform}:{user_id}"`; values are opaque to the store.
//!
//! Two implementations ship with the crate:
//!
//! - [`SledKvStore`] - durable store backed by an embedded sled database, used
//!   by the console host binary
//! - [`MemoryKvStore`] - process-local map, used by tests and ephemeral hosts
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chatgames::storage::{KvStore, SledKvStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SledKvStore::open("./data/records")?;
//!     store.put("discord:42", b"{}".to_vec()).await?;
//!     assert!(store.get("discord:42").await?.is_some());
//!     Ok(())
//! }
//! ```
//!
//! ## Failure semantics
//!
//! `put` is a single overwrite. A failed `put` must leave the previously stored
//! value intact; sled's atomic `insert` gives us that for free, and the memory
//! store only swaps the value once the new bytes are owned.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

const TREE_RECORDS: &str = "chatgames_records";

/// Errors surfaced by key-value store implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for host-provided stores.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Host-supplied durable storage.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
}

/// Sled-backed persistence for user records.
#[derive(Clone)]
pub struct SledKvStore {
    _db: sled::Db,
    records: sled::Tree,
}

impl SledKvStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let records = db.open_tree(TREE_RECORDS)?;
        Ok(Self { _db: db, records })
    }

    /// List all stored keys. Used by the console host's `status` output.
    pub fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for entry in self.records.iter() {
            let (key, _) = entry?;
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(keys)
    }
}

#[async_trait]
impl KvStore for SledKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.records.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.records.insert(key.as_bytes(), value)?;
        self.records.flush_async().await?;
        Ok(())
    }
}

/// In-memory store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
