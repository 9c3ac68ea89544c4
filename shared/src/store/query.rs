//! Collection query executor shared by every paginated list endpoint.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::filter::{Condition, ResourceFilter, SortOrder};
use crate::pagination::{Cursor, Page};
use crate::store::{PageRequest, RecordKey, RecordStore};

/// Comparable value of a sortable field.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Text(String),
    Time(DateTime<Utc>),
}

impl SortValue {
    pub fn text(value: &str) -> Self {
        SortValue::Text(value.to_string())
    }

    /// Unset timestamps sort as the earliest representable instant.
    pub fn time(value: Option<DateTime<Utc>>) -> Self {
        SortValue::Time(value.unwrap_or(DateTime::<Utc>::MIN_UTC))
    }
}

/// Resources that know which of their fields can be sorted on.
pub trait Sortable {
    /// Value of a normalized (lower-case, no underscores) field name, or
    /// `None` when the field is not sortable.
    fn sort_value(&self, field: &str) -> Option<SortValue>;
}

/// Stable in-memory sort of a single page. Unknown fields are a no-op.
pub fn sort_page<T: Sortable>(items: &mut [T], field: &str, order: SortOrder) {
    let known = items
        .first()
        .map_or(false, |item| item.sort_value(field).is_some());
    if !known {
        return;
    }

    items.sort_by(|a, b| {
        let ordering = a.sort_value(field).cmp(&b.sort_value(field));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Which records a list call targets: a whole table (scan) or the records
/// matching an index key.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionSelector {
    pub table: String,
    pub index: Option<String>,
    pub key_condition: Vec<Condition>,
}

impl CollectionSelector {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            index: None,
            key_condition: Vec::new(),
        }
    }

    pub fn index(table: &str, index: &str, key_condition: Vec<Condition>) -> Self {
        Self {
            table: table.to_string(),
            index: Some(index.to_string()),
            key_condition,
        }
    }
}

/// Rebuilds the store-native start position from a cursor.
///
/// Index queries need the table key and the index key of the last item, and
/// the index key is exactly what the key condition pins.
fn exclusive_start_key(cursor: Option<&Cursor>, key_condition: &[Condition]) -> Option<RecordKey> {
    let last_id = cursor?.last_id.as_deref().filter(|id| !id.is_empty())?;

    let mut key = RecordKey::new();
    for condition in key_condition {
        key.insert(condition.attribute().to_string(), condition.value().to_string());
    }
    key.insert("id".to_string(), last_id.to_string());
    Some(key)
}

fn next_cursor_from_key(key: &RecordKey) -> Option<Cursor> {
    if key.is_empty() {
        return None;
    }
    Some(Cursor {
        last_id: key.get("id").cloned(),
        last_created_at: key.get("createdAt").cloned(),
    })
}

/// Lists one page of a collection.
///
/// Issues exactly one store call; the store's page boundary decides
/// `has_more`, so a filtered page may hold fewer than `limit` items.
pub async fn list_collection<T, F>(
    store: &dyn RecordStore,
    selector: CollectionSelector,
    filter: &F,
) -> Result<Page<T>>
where
    T: DeserializeOwned + Sortable,
    F: ResourceFilter + ?Sized,
{
    let options = filter.options();
    let request = PageRequest {
        exclusive_start_key: exclusive_start_key(options.cursor.as_ref(), &selector.key_condition),
        table: selector.table,
        index: selector.index,
        key_condition: selector.key_condition,
        filter: filter.build_expression(),
        limit: Some(options.limit),
    };

    tracing::debug!(
        table = %request.table,
        index = ?request.index,
        limit = options.limit,
        resumed = request.exclusive_start_key.is_some(),
        "Listing collection"
    );

    let page = store.fetch_page(request).await?;

    let mut items = page
        .items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<Vec<T>, _>>()?;

    if let Some((field, order)) = filter.normalized_sort() {
        sort_page(&mut items, &field, order);
    }

    let next_cursor = page.last_evaluated_key.as_ref().and_then(next_cursor_from_key);

    Ok(Page {
        has_more: next_cursor.is_some(),
        items,
        next_cursor,
    })
}
