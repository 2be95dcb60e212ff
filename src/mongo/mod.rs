//! MongoDB maintenance jobs: index management and field deduplication.
//!
//! Both are thin wrappers over driver calls. Neither is transactional, so
//! run them while nothing else writes to the collection.

use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::error::MongoError;

/// Sort direction of every key in an index built by [`ensure_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexOrder {
    #[default]
    Ascending,
    Descending,
}

impl IndexOrder {
    fn direction(self) -> i32 {
        match self {
            IndexOrder::Ascending => 1,
            IndexOrder::Descending => -1,
        }
    }
}

/// Outcome of [`deduplicate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupReport {
    /// Distinct values of the field.
    pub distinct: usize,
    /// Values that had more than one document.
    pub duplicated: usize,
    pub deleted: u64,
}

pub async fn connect(uri: &str) -> Result<Client, MongoError> {
    Ok(Client::with_uri_str(uri).await?)
}

/// Field names of an index key document, ignoring direction.
pub fn key_set(keys: &Document) -> BTreeSet<String> {
    keys.keys().cloned().collect()
}

/// Whether any existing key-set equals `fields` taken as a set.
///
/// A compound index on `(a, b)` matches `[b, a]`, but not `[a]`.
pub fn has_key_set(existing: &[BTreeSet<String>], fields: &[&str]) -> bool {
    let wanted: BTreeSet<String> = fields.iter().map(|f| f.to_string()).collect();
    existing.iter().any(|keys| *keys == wanted)
}

/// Whether `collection` already has an index over exactly `fields`.
pub async fn index_exists(
    collection: &Collection<Document>,
    fields: &[&str],
) -> Result<bool, MongoError> {
    let indexes: Vec<IndexModel> = collection.list_indexes(None).await?.try_collect().await?;
    let existing: Vec<BTreeSet<String>> = indexes.iter().map(|i| key_set(&i.keys)).collect();
    Ok(has_key_set(&existing, fields))
}

/// Create an index over `fields` unless one with the same key-set exists.
///
/// Returns the new index name, or `None` when nothing was created.
pub async fn ensure_index(
    collection: &Collection<Document>,
    fields: &[&str],
    unique: bool,
    order: IndexOrder,
) -> Result<Option<String>, MongoError> {
    if fields.is_empty() {
        return Err(MongoError::EmptyIndex);
    }

    if index_exists(collection, fields).await? {
        warn!(
            "Index on {} already exists in {}",
            fields.join(","),
            collection.name()
        );
        return Ok(None);
    }

    let mut keys = Document::new();
    for field in fields {
        keys.insert(*field, order.direction());
    }
    let model = IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(unique).background(true).build())
        .build();

    let created = collection.create_index(model, None).await?;
    info!("Index created, name is {}", created.index_name);
    Ok(Some(created.index_name))
}

/// Keep one document per distinct value of `field` in `db.collection`.
pub async fn deduplicate(
    uri: &str,
    db: &str,
    collection: &str,
    field: &str,
) -> Result<DedupReport, MongoError> {
    let client = connect(uri).await?;
    let collection = client.database(db).collection::<Document>(collection);
    deduplicate_collection(&collection, field).await
}

pub async fn deduplicate_collection(
    collection: &Collection<Document>,
    field: &str,
) -> Result<DedupReport, MongoError> {
    let values = collection.distinct(field, None, None).await?;
    let mut report = DedupReport {
        distinct: values.len(),
        ..Default::default()
    };

    for value in values {
        info!("Checking {} = {}", field, value);
        let filter = field_filter(field, &value);

        let count = collection.count_documents(filter.clone(), None).await?;
        info!("{} documents", count);
        if count <= 1 {
            info!("{} {} is not repeated", field, value);
            continue;
        }

        let Some(kept) = collection.find_one(filter.clone(), None).await? else {
            continue;
        };
        let Some(kept_id) = kept.get("_id").cloned() else {
            warn!("Document for {} = {} has no _id, skipping", field, value);
            continue;
        };

        let mut others = filter;
        others.insert("_id", doc! { "$ne": kept_id });
        let deleted = collection.delete_many(others, None).await?.deleted_count;

        report.duplicated += 1;
        report.deleted += deleted;
        info!("{} deduplicated, removed {}", value, deleted);
    }

    info!(
        "Dedup of {} on {} done: {} duplicated values, {} documents removed",
        collection.name(),
        field,
        report.duplicated,
        report.deleted
    );
    Ok(report)
}

fn field_filter(field: &str, value: &Bson) -> Document {
    let mut filter = Document::new();
    filter.insert(field, value.clone());
    filter
}
