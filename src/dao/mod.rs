/// Schemaless documents and the queries run against them.
pub mod document;
/// Persisted record definitions.
pub mod models;
/// Typed access to records on top of a document store.
pub mod repository;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Document store backends.
pub mod store;
