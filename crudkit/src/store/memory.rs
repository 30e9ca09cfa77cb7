//! In-memory store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

use super::{ListFilter, ListQuery, Store, StoreError};
use crate::resource::{CreateOf, RecordShape, Resource, SortField, SortOrder, UpdateOf};

/// [`Store`] holding records in a map
///
/// Intended for tests and local development; data does not outlive the process.
pub struct MemoryStore<R: Resource> {
    records: RwLock<HashMap<Uuid, R::Record>>,
}

impl<R: Resource> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<R: Resource> MemoryStore<R> {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with records
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = R::Record>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().map(|r| (r.id(), r)).collect()),
        }
    }

    /// Number of stored records, soft-deleted ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// No records stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn matches(record: &R::Record, filter: &ListFilter) -> bool {
        if R::SOFT_DELETE && !filter.include_deleted && record.deleted_at().is_some() {
            return false;
        }

        filter.search.as_ref().map_or(true, |search| {
            let needle = search.to_lowercase();
            R::SEARCH_FIELDS.iter().any(|field| {
                record
                    .text(field)
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            })
        })
    }

    fn compare(a: &R::Record, b: &R::Record, sort_by: SortField) -> Ordering {
        let primary = match sort_by {
            SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
            SortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
            SortField::Name => a.text("name").cmp(&b.text("name")),
        };
        primary.then_with(|| a.id().cmp(&b.id()))
    }
}

#[async_trait]
impl<R: Resource> Store<R> for MemoryStore<R> {
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<R::Record>, StoreError> {
        let records = self.records.read();
        let mut matching: Vec<&R::Record> = records
            .values()
            .filter(|r| Self::matches(r, &query.filter))
            .collect();

        matching.sort_by(|a, b| {
            let ordering = Self::compare(a, b, query.sort_by);
            match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &ListFilter) -> Result<u64, StoreError> {
        let records = self.records.read();
        let count = records.values().filter(|r| Self::matches(r, filter)).count();
        Ok(count as u64)
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<R::Record>, StoreError> {
        Ok(self
            .records
            .read()
            .get(&id)
            .filter(|r| include_deleted || !R::SOFT_DELETE || r.deleted_at().is_none())
            .cloned())
    }

    async fn insert(
        &self,
        id: Uuid,
        input: CreateOf<R>,
        now: DateTime<Utc>,
    ) -> Result<R::Record, StoreError> {
        let mut records = self.records.write();
        if records.contains_key(&id) {
            return Err(StoreError::UniqueViolation(format!("{}_pkey", R::TABLE)));
        }
        let record = R::Record::from_create(id, input, now);
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: UpdateOf<R>,
        now: DateTime<Utc>,
    ) -> Result<R::Record, StoreError> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or(StoreError::RowNotFound)?;
        record.apply_update(patch, now);
        Ok(record.clone())
    }

    async fn set_deleted_at(
        &self,
        id: Uuid,
        at: Option<DateTime<Utc>>,
    ) -> Result<R::Record, StoreError> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or(StoreError::RowNotFound)?;
        record.set_deleted_at(at);
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.records.write().remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{AccessTier, CreateInput, Record};

    struct Gadget;

    impl Resource for Gadget {
        type Record = Record;
        const NAME: &'static str = "Gadget";
        const PATH: &'static str = "gadget";
        const TABLE: &'static str = "gadgets";
        const ACCESS: AccessTier = AccessTier::Public;
        const SOFT_DELETE: bool = true;
        const SEARCH_FIELDS: &'static [&'static str] = &["name", "description"];
    }

    fn query(filter: ListFilter) -> ListQuery {
        ListQuery {
            filter,
            offset: 0,
            limit: 100,
            sort_by: SortField::Name,
            sort_order: SortOrder::Asc,
        }
    }

    async fn seeded() -> MemoryStore<Gadget> {
        let store = MemoryStore::<Gadget>::new();
        let now = Utc::now();
        for (i, name) in ["Alpha", "beta", "Gamma"].into_iter().enumerate() {
            let mut input = CreateInput::named(name);
            if i == 2 {
                input.description = Some("The BETA successor".to_string());
            }
            store.insert(Uuid::new_v4(), input, now).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_across_fields() {
        let store = seeded().await;
        let filter = ListFilter {
            search: Some("BeTa".to_string()),
            include_deleted: false,
        };

        let found = store.find_many(&query(filter.clone())).await.unwrap();
        let names: Vec<_> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "beta"]);
        assert_eq!(store.count(&filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_soft_deleted_rows_are_hidden() {
        let store = seeded().await;
        let all = store.find_many(&query(ListFilter::default())).await.unwrap();
        let id = all[0].id;

        store.set_deleted_at(id, Some(Utc::now())).await.unwrap();

        assert_eq!(store.count(&ListFilter::default()).await.unwrap(), 2);
        assert!(store.find_by_id(id, false).await.unwrap().is_none());
        assert!(store.find_by_id(id, true).await.unwrap().is_some());

        let with_deleted = ListFilter {
            search: None,
            include_deleted: true,
        };
        assert_eq!(store.count(&with_deleted).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_offset_and_limit() {
        let store = seeded().await;
        let mut page = query(ListFilter::default());
        page.offset = 1;
        page.limit = 1;

        let found = store.find_many(&page).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Gamma");
    }

    #[tokio::test]
    async fn test_writes_on_missing_rows() {
        let store = MemoryStore::<Gadget>::new();
        let id = Uuid::new_v4();

        assert!(matches!(
            store.update(id, Default::default(), Utc::now()).await,
            Err(StoreError::RowNotFound)
        ));
        assert!(matches!(
            store.set_deleted_at(id, None).await,
            Err(StoreError::RowNotFound)
        ));
        assert!(!store.delete(id).await.unwrap());
    }
}
