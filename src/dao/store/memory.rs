//! In-process document store used when no database is configured and in tests.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use indexmap::{IndexMap, map::Entry};

use crate::dao::{
    document::{Document, Query},
    storage::StorageResult,
    store::DocumentStore,
};

type Collection = IndexMap<String, Document>;

/// Collections kept in memory, each preserving insertion order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<&'static str, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_now(&self, collection: &str, id: &str) -> Option<Document> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned())
    }

    fn list_now(&self, collection: &str, query: &Query) -> Vec<Document> {
        let Some(docs) = self.collections.get(collection) else {
            return Vec::new();
        };
        let snapshot: Vec<Document> = docs.values().cloned().collect();
        drop(docs);
        query.apply(snapshot)
    }

    fn put_now(&self, collection: &'static str, id: String, document: Document) {
        self.collections
            .entry(collection)
            .or_default()
            .insert(id, document);
    }

    fn insert_now(&self, collection: &'static str, id: String, document: Document) -> bool {
        let mut docs = self.collections.entry(collection).or_default();
        match docs.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(document);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    fn merge_now(&self, collection: &str, id: &str, fields: Document) -> bool {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return false;
        };
        let Some(existing) = docs.get_mut(id) else {
            return false;
        };
        existing.extend(fields);
        true
    }

    fn delete_now(&self, collection: &str, id: &str) -> bool {
        self.collections
            .get_mut(collection)
            .map(|mut docs| docs.shift_remove(id).is_some())
            .unwrap_or(false)
    }
}

impl DocumentStore for MemoryStore {
    fn get(
        &self,
        collection: &'static str,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        let result = self.get_now(collection, &id);
        futures::future::ready(Ok(result)).boxed()
    }

    fn list(
        &self,
        collection: &'static str,
        query: Query,
    ) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        let result = self.list_now(collection, &query);
        futures::future::ready(Ok(result)).boxed()
    }

    fn put(
        &self,
        collection: &'static str,
        id: String,
        document: Document,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.put_now(collection, id, document);
        futures::future::ready(Ok(())).boxed()
    }

    fn insert(
        &self,
        collection: &'static str,
        id: String,
        document: Document,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inserted = self.insert_now(collection, id, document);
        futures::future::ready(Ok(inserted)).boxed()
    }

    fn merge(
        &self,
        collection: &'static str,
        id: String,
        fields: Document,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let merged = self.merge_now(collection, &id, fields);
        futures::future::ready(Ok(merged)).boxed()
    }

    fn delete(
        &self,
        collection: &'static str,
        id: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let deleted = self.delete_now(collection, &id);
        futures::future::ready(Ok(deleted)).boxed()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        futures::future::ready(Ok(())).boxed()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        futures::future::ready(Ok(())).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::document::Direction;
    use serde_json::{Value, json};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = MemoryStore::new();
        store
            .put("exams", "1".into(), doc(json!({"title": "a"})))
            .await
            .unwrap();

        assert!(store.get("courses", "1".into()).await.unwrap().is_none());
        assert!(store.get("exams", "1".into()).await.unwrap().is_some());
        assert!(store.list("courses", Query::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn put_replaces_and_merge_keeps_other_fields() {
        let store = MemoryStore::new();
        store
            .put("exams", "1".into(), doc(json!({"title": "a", "points": 1})))
            .await
            .unwrap();
        store
            .put("exams", "1".into(), doc(json!({"title": "b"})))
            .await
            .unwrap();
        assert_eq!(
            store.get("exams", "1".into()).await.unwrap(),
            Some(doc(json!({"title": "b"})))
        );

        let merged = store
            .merge("exams", "1".into(), doc(json!({"points": 4})))
            .await
            .unwrap();
        assert!(merged);
        assert_eq!(
            store.get("exams", "1".into()).await.unwrap(),
            Some(doc(json!({"title": "b", "points": 4})))
        );
        assert!(
            !store
                .merge("exams", "2".into(), doc(json!({"points": 4})))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn insert_never_overwrites() {
        let store = MemoryStore::new();
        assert!(
            store
                .insert("users", "u".into(), doc(json!({"name": "first"})))
                .await
                .unwrap()
        );
        assert!(
            !store
                .insert("users", "u".into(), doc(json!({"name": "second"})))
                .await
                .unwrap()
        );
        assert_eq!(
            store.get("users", "u".into()).await.unwrap(),
            Some(doc(json!({"name": "first"})))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_of_one_id_admit_a_single_winner() {
        let store = MemoryStore::new();
        let barrier = Arc::new(tokio::sync::Barrier::new(16));
        let attempts: Vec<_> = (0..16)
            .map(|attempt| {
                let store = store.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    store
                        .insert("submissions", "same".into(), doc(json!({"attempt": attempt})))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut created = 0;
        for attempt in attempts {
            if attempt.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.list("submissions", Query::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_honours_query_and_insertion_order() {
        let store = MemoryStore::new();
        for (id, exam, score) in [("a", "x", 5), ("b", "x", 8), ("c", "y", 9), ("d", "x", 5)] {
            store
                .put(
                    "submissions",
                    id.into(),
                    doc(json!({"id": id, "exam": exam, "score": score})),
                )
                .await
                .unwrap();
        }

        let listed = store
            .list(
                "submissions",
                Query::new()
                    .where_eq("exam", "x")
                    .order_by("score", Direction::Descending),
            )
            .await
            .unwrap();
        let ids: Vec<&str> = listed.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "a", "d"]);

        assert!(store.delete("submissions", "a".into()).await.unwrap());
        let remaining = store.list("submissions", Query::new()).await.unwrap();
        let ids: Vec<&str> = remaining.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "c", "d"]);
    }
}
