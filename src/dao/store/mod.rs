#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::env;

use futures::future::BoxFuture;

use crate::dao::{
    document::{Document, Query},
    storage::StorageResult,
};

/// Abstraction over the document database backing every collection.
pub trait DocumentStore: Send + Sync {
    fn get(
        &self,
        collection: &'static str,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>>;
    fn list(
        &self,
        collection: &'static str,
        query: Query,
    ) -> BoxFuture<'static, StorageResult<Vec<Document>>>;
    /// Create or replace the document stored under `id`.
    fn put(
        &self,
        collection: &'static str,
        id: String,
        document: Document,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Store the document only if `id` is free. Returns `false`, leaving the
    /// existing document untouched, when the identifier is already taken.
    fn insert(
        &self,
        collection: &'static str,
        id: String,
        document: Document,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Overwrite the given top-level fields, keeping the others. Returns
    /// `false` when the document does not exist.
    fn merge(
        &self,
        collection: &'static str,
        id: String,
        fields: Document,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn delete(&self, collection: &'static str, id: String)
    -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Storage backend selected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Mongo,
    Couch,
}

impl BackendKind {
    /// Read `STORAGE_BACKEND`, falling back to whichever connection variables are present.
    pub fn from_env() -> Self {
        match env::var("STORAGE_BACKEND").ok().as_deref() {
            Some("memory") => Self::Memory,
            Some("mongo") | Some("mongodb") => Self::Mongo,
            Some("couch") | Some("couchdb") => Self::Couch,
            _ if env::var_os("MONGO_URI").is_some() => Self::Mongo,
            _ if env::var_os("COUCH_BASE_URL").is_some() => Self::Couch,
            _ => Self::Memory,
        }
    }
}
