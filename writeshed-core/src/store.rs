//! The document-store client (MongoDB). No example repository in this
//! corpus talks to MongoDB; this module is grounded on the upstream
//! repository client *pattern* (a thin struct wrapping a pooled client,
//! exposing exactly the operations the rest of the system needs) rather
//! than any one source file, with `mongodb` introduced because it is the
//! ecosystem-standard async driver — see DESIGN.md.

use mongodb::bson::{doc, Document};
use mongodb::options::InsertManyOptions;
use mongodb::{Client, Collection};

use crate::constants::{
    CONNECT_TIMEOUT_SECS, MONGO_COLLECTION, MONGO_DB_NAME, SOCKET_TIMEOUT_SECS, WRITE_DOC_TYPE,
};
use crate::error::StoreError;
use crate::model::WriteDoc;

#[derive(Clone)]
pub struct DocumentStore {
    collection: Collection<Document>,
}

impl DocumentStore {
    pub async fn connect(uri: &str, max_pool_size: u32) -> Result<Self, StoreError> {
        let mut options = mongodb::options::ClientOptions::parse(uri)
            .await
            .map_err(StoreError::from)?;
        options.max_pool_size = Some(max_pool_size);
        options.min_pool_size = Some(0);
        options.connect_timeout = Some(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS));
        options.server_selection_timeout = Some(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS));
        options.socket_timeout = Some(std::time::Duration::from_secs(SOCKET_TIMEOUT_SECS));

        let client = Client::with_options(options).map_err(StoreError::from)?;
        let db = client.database(MONGO_DB_NAME);

        // Fail fast if the store is unreachable at startup rather than on
        // first request.
        db.run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(StoreError::from)?;

        let collection = db.collection::<Document>(MONGO_COLLECTION);
        Ok(Self { collection })
    }

    /// Insert a batch of documents as an unordered bulk insert: a single
    /// document failure (e.g. a permanent duplicate-key error) does not
    /// abort the rest of the batch. Returns the number of documents
    /// actually inserted, even on partial failure.
    pub async fn bulk_insert(&self, docs: &[WriteDoc]) -> Result<u64, StoreError> {
        if docs.is_empty() {
            return Ok(0);
        }

        let bson_docs: Vec<Document> = docs
            .iter()
            .map(|d| {
                mongodb::bson::to_document(d)
                    .map_err(|e| StoreError::Operation(format!("bson encode failed: {e}")))
            })
            .collect::<Result<_, _>>()?;

        let options = InsertManyOptions::builder().ordered(false).build();

        match self.collection.insert_many(&bson_docs, options).await {
            Ok(result) => Ok(result.inserted_ids.len() as u64),
            Err(e) => match e.kind.as_ref() {
                // Unordered insert: some documents may have committed even
                // though the overall call reports an error for the rest.
                mongodb::error::ErrorKind::BulkWrite(failure) => {
                    let inserted = failure.inserted_ids.len() as u64;
                    if inserted > 0 {
                        Ok(inserted)
                    } else {
                        Err(StoreError::Operation(e.to_string()))
                    }
                }
                _ => Err(StoreError::from(e)),
            },
        }
    }

    /// Read a single document of `doc_type`, used by the ingress's
    /// cache-aside fallback path on a cache miss. Returns the
    /// store-assigned id alongside the decoded document.
    pub async fn find_one_by_type(&self, doc_type: &str) -> Result<Option<(String, WriteDoc)>, StoreError> {
        let filter = doc! { "type": doc_type };
        match self
            .collection
            .find_one(filter, None)
            .await
            .map_err(StoreError::from)?
        {
            Some(mut bson_doc) => {
                let id = bson_doc
                    .remove("_id")
                    .map(|v| match v {
                        mongodb::bson::Bson::ObjectId(oid) => oid.to_hex(),
                        other => other.to_string(),
                    })
                    .unwrap_or_default();
                let parsed = mongodb::bson::from_document::<WriteDoc>(bson_doc)
                    .map_err(|e| StoreError::Operation(format!("bson decode failed: {e}")))?;
                Ok(Some((id, parsed)))
            }
            None => Ok(None),
        }
    }

    /// Total document count, used by `/api/stats`.
    pub async fn count(&self) -> Result<u64, StoreError> {
        self.collection
            .count_documents(doc! {}, None)
            .await
            .map_err(StoreError::from)
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.collection
            .estimated_document_count(None)
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }
}

impl WriteDoc {
    pub fn is_write_type(&self) -> bool {
        self.doc_type == WRITE_DOC_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Exercises bulk_insert -> find_one_by_type -> count against a live
    /// MongoDB instance. Gated the same way as the broker's round-trip
    /// test: runnable when `WRITESHED_TEST_MONGO_URI` is set, skipped by
    /// default.
    #[tokio::test]
    #[ignore = "requires a live MongoDB reachable at WRITESHED_TEST_MONGO_URI"]
    async fn bulk_insert_then_find_one_round_trips() {
        let uri = std::env::var("WRITESHED_TEST_MONGO_URI").expect("WRITESHED_TEST_MONGO_URI not set");
        let store = DocumentStore::connect(&uri, 4).await.expect("connect");

        let before = store.count().await.expect("count");

        let doc = WriteDoc::new(0, b"integration-test-payload".to_vec());
        let inserted = store.bulk_insert(&[doc]).await.expect("bulk_insert");
        assert_eq!(inserted, 1);

        let after = store.count().await.expect("count");
        assert_eq!(after, before + 1);

        let found = store
            .find_one_by_type(WRITE_DOC_TYPE)
            .await
            .expect("find_one_by_type")
            .expect("at least one write document should exist");
        assert!(found.1.is_write_type());
    }
}
