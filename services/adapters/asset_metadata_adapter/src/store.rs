//! Persisted keyed documents
//!
//! Every store is a JSON object: token addresses per network, one global
//! decimals document, pools per (network, dex) and read-only dex info.
//! Key order is preserved exactly as written.
//!
//! Reads never fail. A missing, unreadable or unparseable file is an empty
//! document, and a write over it starts a fresh document containing only
//! the new entry.

use async_trait::async_trait;
use dashmap::DashMap;
use metadata_config::service::store::{DECIMALS_FILE, NETWORK_DATA_DIR};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::StoreError;

/// A persisted JSON object
pub type Document = Map<String, Value>;

/// Identifies one persisted document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Symbol to address, one per network
    TokenAddresses { network: String },
    /// Symbol to decimals, shared by all networks
    TokenDecimals,
    /// Base → quote → fee tier → pool address, one per (network, dex)
    Pools { network: String, dex: String },
    /// Factory/router information, one per (network, dex)
    DexInfo { network: String, dex: String },
}

impl StoreKey {
    /// File location relative to the store root
    pub fn relative_path(&self) -> PathBuf {
        match self {
            StoreKey::TokenAddresses { network } => PathBuf::from(NETWORK_DATA_DIR)
                .join(network)
                .join("tokens")
                .join(format!("{}_token_addresses.json", network)),
            StoreKey::TokenDecimals => PathBuf::from(DECIMALS_FILE),
            StoreKey::Pools { network, dex } => Self::dex_dir(network, dex)
                .join(format!("{}_{}_pools.json", dex, network)),
            StoreKey::DexInfo { network, dex } => Self::dex_dir(network, dex)
                .join(format!("{}_{}_info.json", dex, network)),
        }
    }

    fn dex_dir(network: &str, dex: &str) -> PathBuf {
        PathBuf::from(NETWORK_DATA_DIR)
            .join(network)
            .join("dexs")
            .join(dex)
    }
}

/// Keyed document storage with atomic read-modify-write
#[async_trait]
pub trait Store: Send + Sync {
    /// Load a document; absent or corrupt documents load as empty
    async fn load(&self, key: &StoreKey) -> Document;

    /// Load, mutate and persist a document as one exclusive step
    async fn update(
        &self,
        key: &StoreKey,
        mutate: &mut (dyn for<'d> FnMut(&'d mut Document) + Send),
    ) -> Result<(), StoreError>;
}

/// File-backed store rooted at a data directory
pub struct JsonFileStore {
    root: PathBuf,

    /// One lock per store file, held across each read-modify-write
    locks: DashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a document
    pub fn path_for(&self, key: &StoreKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    fn lock_for(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.entry(path.to_path_buf()).or_default().clone()
    }

    async fn read_document(path: &Path) -> Document {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No store file at {:?}, starting empty", path);
                return Document::new();
            }
            Err(e) => {
                warn!("Unreadable store file {:?}, treating as empty: {}", path, e);
                return Document::new();
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(document)) => document,
            Ok(_) => {
                warn!("Store file {:?} is not a JSON object, treating as empty", path);
                Document::new()
            }
            Err(e) => {
                warn!("Corrupt store file {:?}, treating as empty: {}", path, e);
                Document::new()
            }
        }
    }

    async fn write_document(path: &Path, document: &Document) -> Result<(), StoreError> {
        let io_error = |source: std::io::Error| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let data = serde_json::to_vec_pretty(document)?;

        // Replace by rename so readers never observe a partial file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data).await.map_err(io_error)?;
        fs::rename(&tmp, path).await.map_err(io_error)?;

        debug!("Saved {} keys to {:?}", document.len(), path);
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load(&self, key: &StoreKey) -> Document {
        Self::read_document(&self.path_for(key)).await
    }

    async fn update(
        &self,
        key: &StoreKey,
        mutate: &mut (dyn for<'d> FnMut(&'d mut Document) + Send),
    ) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let lock = self.lock_for(&path);
        let _guard = lock.lock().await;

        let mut document = Self::read_document(&path).await;
        mutate(&mut document);
        Self::write_document(&path, &document).await
    }
}

/// In-memory store for tests and ephemeral use
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<StoreKey, Document>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without counting it as a write
    pub fn insert(&self, key: StoreKey, document: Document) {
        self.documents.lock().insert(key, document);
    }

    /// Copy of a document, if one was ever written or seeded
    pub fn snapshot(&self, key: &StoreKey) -> Option<Document> {
        self.documents.lock().get(key).cloned()
    }

    /// Number of completed `update` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self, key: &StoreKey) -> Document {
        self.snapshot(key).unwrap_or_default()
    }

    async fn update(
        &self,
        key: &StoreKey,
        mutate: &mut (dyn for<'d> FnMut(&'d mut Document) + Send),
    ) -> Result<(), StoreError> {
        {
            let mut documents = self.documents.lock();
            let document = documents.entry(key.clone()).or_default();
            mutate(document);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
