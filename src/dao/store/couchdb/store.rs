use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
};
use crate::dao::{
    document::{Document, Query},
    storage::StorageResult,
    store::DocumentStore,
};

const ID_FIELD: &str = "_id";
const REV_FIELD: &str = "_rev";
const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
struct AllDocsResponse {
    rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
    #[serde(default)]
    doc: Option<Value>,
}

fn doc_prefix(collection: &str) -> String {
    format!("{collection}::")
}

fn doc_id(collection: &str, id: &str) -> String {
    format!("{collection}::{id}")
}

/// Drop CouchDB bookkeeping fields, returning the revision alongside the body.
fn split_revision(mut body: Document) -> (Document, Option<String>) {
    body.remove(ID_FIELD);
    let rev = match body.remove(REV_FIELD) {
        Some(Value::String(rev)) => Some(rev),
        _ => None,
    };
    (body, rev)
}

/// [`DocumentStore`] backed by a single CouchDB database. Every collection
/// shares it, with document ids prefixed by the collection name.
#[derive(Clone)]
pub struct CouchDocumentStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

/// Send a prepared request, naming it by method and target on transport failure.
async fn send(builder: RequestBuilder, method: Method, target: &str) -> CouchResult<Response> {
    builder
        .send()
        .await
        .map_err(|source| CouchDaoError::Transport {
            method,
            target: target.to_string(),
            source,
        })
}

impl CouchDocumentStore {
    /// Build the HTTP client and create the database when missing.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder().build().map_err(CouchDaoError::Client)?;

        let store = Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            database: Arc::from(config.database),
            auth: config
                .username
                .zip(config.password)
                .map(|(user, pass)| (Arc::<str>::from(user), Arc::<str>::from(pass))),
        };
        store.ensure_database().await?;
        Ok(store)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some((user, pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn on_database(&self, method: Method) -> RequestBuilder {
        self.authorized(self.client.request(method, self.database_url()))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authorized(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.as_ref();
        let response = send(self.on_database(Method::GET), Method::GET, database).await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = send(self.on_database(Method::PUT), Method::PUT, database).await?;
                if created.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::rejected(Method::PUT, database, created.status()))
                }
            }
            other => Err(CouchDaoError::rejected(Method::GET, database, other)),
        }
    }

    async fn ping(&self) -> CouchResult<()> {
        let database = self.database.as_ref();
        let response = send(self.on_database(Method::GET), Method::GET, database).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::rejected(Method::GET, database, response.status()))
        }
    }

    /// Fetch the raw body, `_id` and `_rev` included.
    async fn fetch(&self, collection: &'static str, id: &str) -> CouchResult<Option<Document>> {
        let path = doc_id(collection, id);
        let response = send(self.request(Method::GET, &path), Method::GET, &path).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response
                    .json::<Value>()
                    .await
                    .map_err(|source| CouchDaoError::Decode {
                        target: path,
                        source,
                    })?;
                match body {
                    Value::Object(body) => Ok(Some(body)),
                    _ => Err(CouchDaoError::NotAnObject {
                        collection,
                        id: id.to_string(),
                    }),
                }
            }
            other => Err(CouchDaoError::rejected(Method::GET, path, other)),
        }
    }

    async fn store(
        &self,
        collection: &'static str,
        id: &str,
        mut body: Document,
        rev: Option<String>,
    ) -> CouchResult<()> {
        let path = doc_id(collection, id);
        if let Some(rev) = rev {
            body.insert(REV_FIELD.to_string(), Value::String(rev));
        }
        let builder = self.request(Method::PUT, &path).json(&body);
        let response = send(builder, Method::PUT, &path).await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::rejected(Method::PUT, path, response.status()))
        }
    }

    /// PUT without a revision: CouchDB answers 409 when the id is taken.
    async fn create(&self, collection: &'static str, id: &str, body: Document) -> CouchResult<bool> {
        let path = doc_id(collection, id);
        let builder = self.request(Method::PUT, &path).json(&body);
        let response = send(builder, Method::PUT, &path).await?;

        match response.status() {
            StatusCode::CONFLICT => Ok(false),
            status if status.is_success() => Ok(true),
            other => Err(CouchDaoError::rejected(Method::PUT, path, other)),
        }
    }

    async fn load(&self, collection: &'static str, id: &str) -> CouchResult<Option<Document>> {
        Ok(self
            .fetch(collection, id)
            .await?
            .map(|body| split_revision(body).0))
    }

    async fn save(&self, collection: &'static str, id: &str, document: Document) -> CouchResult<()> {
        let rev = match self.fetch(collection, id).await? {
            Some(existing) => split_revision(existing).1,
            None => None,
        };
        self.store(collection, id, document, rev).await
    }

    async fn merge_fields(
        &self,
        collection: &'static str,
        id: &str,
        fields: Document,
    ) -> CouchResult<bool> {
        let Some(existing) = self.fetch(collection, id).await? else {
            return Ok(false);
        };
        let (mut body, rev) = split_revision(existing);
        body.extend(fields);
        self.store(collection, id, body, rev).await?;
        Ok(true)
    }

    async fn remove(&self, collection: &'static str, id: &str) -> CouchResult<bool> {
        let Some(existing) = self.fetch(collection, id).await? else {
            return Ok(false);
        };
        let Some(rev) = split_revision(existing).1 else {
            return Ok(false);
        };
        let path = doc_id(collection, id);
        let builder = self.request(Method::DELETE, &path).query(&[("rev", rev)]);
        let response = send(builder, Method::DELETE, &path).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            other => Err(CouchDaoError::rejected(Method::DELETE, path, other)),
        }
    }

    /// Load every document of the collection, then filter and order in memory.
    async fn list_matching(&self, collection: &'static str, query: Query) -> CouchResult<Vec<Document>> {
        const ALL_DOCS: &str = "_all_docs";
        let prefix = doc_prefix(collection);
        let params = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{prefix}\"")),
            ("endkey", format!("\"{prefix}{END_SUFFIX}\"")),
        ];

        let builder = self.request(Method::GET, ALL_DOCS).query(&params);
        let response = send(builder, Method::GET, ALL_DOCS).await?;

        if !response.status().is_success() {
            return Err(CouchDaoError::rejected(Method::GET, ALL_DOCS, response.status()));
        }

        let payload = response
            .json::<AllDocsResponse>()
            .await
            .map_err(|source| CouchDaoError::Decode {
                target: ALL_DOCS.to_string(),
                source,
            })?;

        let documents = payload.rows.into_iter().filter_map(|row| match row.doc {
            Some(Value::Object(body)) => Some(split_revision(body).0),
            _ => None,
        });
        Ok(query.apply(documents))
    }
}

impl DocumentStore for CouchDocumentStore {
    fn get(
        &self,
        collection: &'static str,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        let store = self.clone();
        Box::pin(async move { store.load(collection, &id).await.map_err(Into::into) })
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
                .save(collection, &id, document)
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
                .create(collection, &id, document)
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
                .merge_fields(collection, &id, fields)
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
        Box::pin(async move { store.remove(collection, &id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_ids_are_namespaced_by_collection() {
        assert_eq!(doc_id("exams", "42"), "exams::42");
        assert!(doc_id("exams", "42").starts_with(&doc_prefix("exams")));
        assert!(!doc_id("exams_archive", "1").starts_with(&doc_prefix("exams")));
    }

    #[test]
    fn revision_fields_are_stripped() {
        let body = json!({"_id": "exams::1", "_rev": "3-abc", "title": "t"})
            .as_object()
            .cloned()
            .unwrap();
        let (body, rev) = split_revision(body);
        assert_eq!(rev.as_deref(), Some("3-abc"));
        assert_eq!(Value::Object(body), json!({"title": "t"}));
    }
}
