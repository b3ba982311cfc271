use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, bson,
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure},
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    convert::{fields_to_bson, from_stored, id_filter, query_filter, query_sort, to_stored},
    error::{MongoDaoError, MongoResult},
};
use crate::dao::{
    document::{Document, Query},
    storage::StorageResult,
    store::DocumentStore,
};

/// [`DocumentStore`] backed by one MongoDB database, one collection per record kind.
#[derive(Clone)]
pub struct MongoDocumentStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

const DUPLICATE_KEY: i32 = 11_000;

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoDocumentStore {
    /// Connect to MongoDB and make sure lookup indexes exist.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = establish_connection(&config.options, &config.database_name).await?;
        let store = Self {
            inner: Arc::new(MongoInner {
                database: RwLock::new(database),
                config,
            }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        const INDEXES: [(&str, &str); 3] = [
            ("users", "email"),
            ("submissions", "exam_id"),
            ("exams", "starts_at_ms"),
        ];
        for (collection, field) in INDEXES {
            let mut keys = bson::Document::new();
            keys.insert(field, 1_i32);
            let index = mongodb::IndexModel::builder().keys(keys).build();
            self.collection(collection)
                .await
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: field,
                    source,
                })?;
        }
        Ok(())
    }

    async fn collection(&self, name: &str) -> Collection<bson::Document> {
        self.inner
            .database
            .read()
            .await
            .collection::<bson::Document>(name)
    }

    async fn load(&self, collection: &'static str, id: String) -> MongoResult<Option<Document>> {
        let found = self
            .collection(collection)
            .await
            .find_one(id_filter(&id))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection,
                id,
                source,
            })?;
        Ok(found.map(from_stored))
    }

    async fn list_matching(
        &self,
        collection: &'static str,
        query: Query,
    ) -> MongoResult<Vec<Document>> {
        let handle = self.collection(collection).await;
        let mut find = handle.find(query_filter(&query));
        if let Some(sort) = query_sort(&query) {
            find = find.sort(sort);
        }
        if let Some(limit) = query.limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        let cursor = find
            .await
            .map_err(|source| MongoDaoError::List { collection, source })?;
        let documents: Vec<bson::Document> = cursor
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List { collection, source })?;
        Ok(documents.into_iter().map(from_stored).collect())
    }

    async fn save(&self, collection: &'static str, id: String, document: Document) -> MongoResult<()> {
        let stored = to_stored(&id, document);
        self.collection(collection)
            .await
            .replace_one(id_filter(&id), stored)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Save {
                collection,
                id,
                source,
            })?;
        Ok(())
    }

    async fn create(
        &self,
        collection: &'static str,
        id: String,
        document: Document,
    ) -> MongoResult<bool> {
        let stored = to_stored(&id, document);
        match self.collection(collection).await.insert_one(stored).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::Save {
                collection,
                id,
                source,
            }),
        }
    }

    async fn set_fields(
        &self,
        collection: &'static str,
        id: String,
        fields: Document,
    ) -> MongoResult<bool> {
        let update = doc! { "$set": fields_to_bson(fields) };
        let result = self
            .collection(collection)
            .await
            .update_one(id_filter(&id), update)
            .await
            .map_err(|source| MongoDaoError::Save {
                collection,
                id,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn remove(&self, collection: &'static str, id: String) -> MongoResult<bool> {
        let result = self
            .collection(collection)
            .await
            .delete_one(id_filter(&id))
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection,
                id,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }
}

impl DocumentStore for MongoDocumentStore {
    fn get(
        &self,
        collection: &'static str,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        let store = self.clone();
        Box::pin(async move { store.load(collection, id).await.map_err(Into::into) })
    }

    fn list(
        &self,
        collection: &'static str,
        query: Query,
    ) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_matching(collection, query)
                .await
                .map_err(Into::into)
        })
    }

    fn put(
        &self,
        collection: &'static str,
        id: String,
        document: Document,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save(collection, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn insert(
        &self,
        collection: &'static str,
        id: String,
        document: Document,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .create(collection, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn merge(
        &self,
        collection: &'static str,
        id: String,
        fields: Document,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .set_fields(collection, id, fields)
                .await
                .map_err(Into::into)
        })
    }

    fn delete(
        &self,
        collection: &'static str,
        id: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.remove(collection, id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.reconnect().await?;
            store.inner.ping().await?;
            Ok(())
        })
    }
}
