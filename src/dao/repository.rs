use std::{marker::PhantomData, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::dao::{
    document::{Document, Query},
    storage::StorageError,
    store::DocumentStore,
};

/// A serializable record living in a named collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection the record is stored in.
    const COLLECTION: &'static str;

    /// Identifier used as the document key.
    fn record_id(&self) -> String;
}

/// Failures raised by [`Repository`] operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to encode record for collection `{collection}`")]
    Encode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("record for collection `{collection}` is not a JSON object")]
    NotAnObject { collection: &'static str },
    #[error("failed to decode record from collection `{collection}`")]
    Decode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed access to one collection of a [`DocumentStore`].
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            marker: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            marker: PhantomData,
        }
    }

    /// Fetch a record by identifier.
    pub async fn get(&self, id: &str) -> Result<Option<T>, RepositoryError> {
        let document = self.store.get(T::COLLECTION, id.to_string()).await?;
        document.map(decode::<T>).transpose()
    }

    /// List the records matching the query.
    pub async fn list(&self, query: Query) -> Result<Vec<T>, RepositoryError> {
        let documents = self.store.list(T::COLLECTION, query).await?;
        documents.into_iter().map(decode::<T>).collect()
    }

    /// Fetch the first record matching the query, if any.
    pub async fn find_one(&self, query: Query) -> Result<Option<T>, RepositoryError> {
        Ok(self.list(query.limit(1)).await?.into_iter().next())
    }

    /// Create or replace a record.
    pub async fn put(&self, record: &T) -> Result<(), RepositoryError> {
        let document = encode(record)?;
        self.store
            .put(T::COLLECTION, record.record_id(), document)
            .await?;
        Ok(())
    }

    /// Create a record unless one already uses its identifier. Returns whether
    /// the record was created.
    pub async fn insert(&self, record: &T) -> Result<bool, RepositoryError> {
        let document = encode(record)?;
        Ok(self
            .store
            .insert(T::COLLECTION, record.record_id(), document)
            .await?)
    }

    /// Merge the serialized fields of `patch` into an existing record.
    ///
    /// Returns `false` when no record has this identifier.
    pub async fn update<P: Serialize>(&self, id: &str, patch: &P) -> Result<bool, RepositoryError> {
        let fields = encode_value::<P>(patch, T::COLLECTION)?;
        if fields.is_empty() {
            return Ok(self.get(id).await?.is_some());
        }
        Ok(self
            .store
            .merge(T::COLLECTION, id.to_string(), fields)
            .await?)
    }

    /// Delete a record. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.store.delete(T::COLLECTION, id.to_string()).await?)
    }
}

fn encode<T: Record>(record: &T) -> Result<Document, RepositoryError> {
    encode_value(record, T::COLLECTION)
}

fn encode_value<P: Serialize>(
    value: &P,
    collection: &'static str,
) -> Result<Document, RepositoryError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(RepositoryError::NotAnObject { collection }),
        Err(source) => Err(RepositoryError::Encode { collection, source }),
    }
}

fn decode<T: Record>(document: Document) -> Result<T, RepositoryError> {
    serde_json::from_value(Value::Object(document)).map_err(|source| RepositoryError::Decode {
        collection: T::COLLECTION,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{
        document::Direction,
        models::{CourseEntity, LessonEntity},
        store::memory::MemoryStore,
    };
    use serde::Serialize;
    use uuid::Uuid;

    fn course(title: &str, created_at_ms: i64) -> CourseEntity {
        CourseEntity {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            lessons: vec![LessonEntity {
                title: "Intro".into(),
                video_url: "https://video.example.org/intro".into(),
                notes: None,
            }],
            created_at_ms,
            updated_at_ms: created_at_ms,
        }
    }

    #[derive(Serialize)]
    struct TitlePatch<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<&'a str>,
    }

    #[tokio::test]
    async fn put_get_list_update_delete() {
        let repo = Repository::<CourseEntity>::new(Arc::new(MemoryStore::new()));
        let older = course("Ownership", 10);
        let newer = course("Lifetimes", 20);
        repo.put(&older).await.unwrap();
        repo.put(&newer).await.unwrap();

        let id = older.id.to_string();
        assert_eq!(repo.get(&id).await.unwrap(), Some(older.clone()));

        let listed = repo
            .list(Query::new().order_by("created_at_ms", Direction::Descending))
            .await
            .unwrap();
        assert_eq!(listed, vec![newer.clone(), older.clone()]);

        let patch = TitlePatch {
            title: Some("Ownership 101"),
            description: None,
        };
        assert!(repo.update(&id, &patch).await.unwrap());
        let updated = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(updated.title, "Ownership 101");
        assert_eq!(updated.lessons, older.lessons);

        assert!(repo.delete(&id).await.unwrap());
        assert!(!repo.delete(&id).await.unwrap());
        assert_eq!(repo.get(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn insert_refuses_a_taken_identifier() {
        let repo = Repository::<CourseEntity>::new(Arc::new(MemoryStore::new()));
        let original = course("Ownership", 1);
        assert!(repo.insert(&original).await.unwrap());

        let mut clash = course("Borrowing", 2);
        clash.id = original.id;
        assert!(!repo.insert(&clash).await.unwrap());
        assert_eq!(repo.get(&original.id.to_string()).await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn updating_a_missing_record_reports_false() {
        let repo = Repository::<CourseEntity>::new(Arc::new(MemoryStore::new()));
        let patch = TitlePatch {
            title: Some("ghost"),
            description: None,
        };
        assert!(!repo.update("missing", &patch).await.unwrap());
    }

    #[tokio::test]
    async fn find_one_by_field() {
        let repo = Repository::<CourseEntity>::new(Arc::new(MemoryStore::new()));
        let wanted = course("Traits", 1);
        repo.put(&course("Macros", 2)).await.unwrap();
        repo.put(&wanted).await.unwrap();

        let found = repo
            .find_one(Query::new().where_eq("title", "Traits"))
            .await
            .unwrap();
        assert_eq!(found, Some(wanted));
    }
}
