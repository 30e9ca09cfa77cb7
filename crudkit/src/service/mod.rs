//! Generic CRUD service
//!
//! [`CrudService`] is built per request from a [`Context`]. It enforces the
//! resource's access tier, validates inputs, and maps store failures onto the
//! error taxonomy. It holds no state of its own.

mod context;

pub use context::{Caller, Context, ParseRoleError, Role};

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::resource::{
    AccessTier, CreateOf, DeleteOutput, ListInput, ListOutput, PageInfo, RecordShape, Resource,
    UpdateOf,
};
use crate::store::{ListFilter, ListQuery, Store};

/// CRUD operations for one resource
pub struct CrudService<R: Resource> {
    store: Arc<dyn Store<R>>,
    caller: Option<Caller>,
    correlation_id: Option<String>,
}

impl<R: Resource> CrudService<R> {
    /// Build the service for a request
    ///
    /// # Errors
    ///
    /// Returns `INTERNAL_ERROR` if no store is registered for the resource
    pub fn new(ctx: &Context) -> Result<Self, ApiError> {
        let store = ctx.registry().store::<R>().ok_or_else(|| {
            ApiError::internal(format!("no store registered for {}", R::NAME))
        })?;

        Ok(Self {
            store,
            caller: ctx.caller().cloned(),
            correlation_id: ctx.correlation_id().map(ToString::to_string),
        })
    }

    fn is_admin(&self) -> bool {
        self.caller.as_ref().is_some_and(|c| c.role.is_admin())
    }

    fn caller_id(&self) -> Option<&str> {
        self.caller.as_ref().map(|c| c.user_id.as_str())
    }

    /// Check the caller against the resource's access tier
    ///
    /// Every operation does this itself; the router also calls it before
    /// reading the request body.
    ///
    /// # Errors
    ///
    /// `UNAUTHORIZED` for anonymous callers on non-public resources,
    /// `FORBIDDEN` for non-admins on admin resources
    pub fn authorize(&self) -> Result<(), ApiError> {
        match (R::ACCESS, &self.caller) {
            (AccessTier::Public, _) => Ok(()),
            (_, None) => Err(ApiError::unauthorized()),
            (AccessTier::Protected, Some(_)) => Ok(()),
            (AccessTier::Admin, Some(caller)) if caller.role.is_admin() => Ok(()),
            (AccessTier::Admin, Some(caller)) => Err(ApiError::forbidden(format!(
                "{} requires an admin role, caller {} has role {}",
                R::NAME,
                caller.user_id,
                caller.role
            ))),
        }
    }

    fn require_soft_delete(action: &str) -> Result<(), ApiError> {
        if R::SOFT_DELETE {
            Ok(())
        } else {
            Err(ApiError::validation(format!(
                "{} does not support {action}",
                R::NAME
            )))
        }
    }

    /// One page of records
    ///
    /// # Errors
    ///
    /// `VALIDATION_ERROR` for a page below 1 or a limit outside `1..=100`
    pub async fn list(&self, input: ListInput) -> Result<ListOutput<R::Record>, ApiError> {
        self.authorize()?;
        input.validate()?;

        let search = input
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        let filter = ListFilter {
            search,
            include_deleted: input.include_deleted && self.is_admin(),
        };
        let query = ListQuery {
            filter,
            offset: input.offset(),
            limit: u64::from(input.limit),
            sort_by: input.sort_by,
            sort_order: input.sort_order,
        };

        let items = self.store.find_many(&query).await.map_err(|e| {
            tracing::error!(model = R::NAME, action = "list", error = %e, "list failed");
            ApiError::from(e)
        })?;
        let total = self.store.count(&query.filter).await?;

        Ok(ListOutput {
            items,
            pagination: PageInfo::new(input.page, input.limit, total),
        })
    }

    /// Record by id
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` if the record does not exist, or is soft-deleted and the caller is not an admin
    pub async fn get(&self, id: Uuid) -> Result<R::Record, ApiError> {
        self.authorize()?;
        self.find(id).await
    }

    async fn find(&self, id: Uuid) -> Result<R::Record, ApiError> {
        self.store
            .find_by_id(id, self.is_admin())
            .await?
            .ok_or_else(|| ApiError::not_found(format!("{} {id}", R::NAME)))
    }

    /// Persist a new record
    ///
    /// # Errors
    ///
    /// `VALIDATION_ERROR` for invalid input, `CONFLICT` on a constraint violation
    pub async fn create(&self, input: CreateOf<R>) -> Result<R::Record, ApiError> {
        self.authorize()?;
        input.validate()?;

        let record = self
            .store
            .insert(Uuid::new_v4(), input, Utc::now())
            .await
            .map_err(|e| {
                tracing::error!(model = R::NAME, action = "create", error = %e, "create failed");
                ApiError::from(e)
            })?;

        tracing::info!(
            model = R::NAME,
            action = "create",
            id = %record.id(),
            user_id = ?self.caller_id(),
            correlation_id = ?self.correlation_id,
            "record created"
        );
        Ok(record)
    }

    /// Merge a partial update into an existing record
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` if the record does not exist, `VALIDATION_ERROR` for invalid input
    pub async fn update(&self, id: Uuid, patch: UpdateOf<R>) -> Result<R::Record, ApiError> {
        self.authorize()?;
        patch.validate()?;
        self.find(id).await?;

        let record = self.store.update(id, patch, Utc::now()).await?;

        tracing::info!(
            model = R::NAME,
            action = "update",
            %id,
            user_id = ?self.caller_id(),
            correlation_id = ?self.correlation_id,
            "record updated"
        );
        Ok(record)
    }

    /// Mark a record deleted; a no-op if it already is
    ///
    /// # Errors
    ///
    /// `VALIDATION_ERROR` for hard-delete resources, `NOT_FOUND` for unknown ids
    pub async fn soft_delete(&self, id: Uuid) -> Result<R::Record, ApiError> {
        self.authorize()?;
        Self::require_soft_delete("soft delete")?;

        let existing = self
            .store
            .find_by_id(id, true)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("{} {id}", R::NAME)))?;
        if existing.deleted_at().is_some() {
            return Ok(existing);
        }

        let record = self.store.set_deleted_at(id, Some(Utc::now())).await?;

        tracing::info!(
            model = R::NAME,
            action = "soft_delete",
            %id,
            user_id = ?self.caller_id(),
            correlation_id = ?self.correlation_id,
            "record soft-deleted"
        );
        Ok(record)
    }

    /// Clear a record's deletion marker; a no-op if it is not deleted
    ///
    /// # Errors
    ///
    /// `VALIDATION_ERROR` for hard-delete resources, `NOT_FOUND` for unknown ids
    pub async fn restore(&self, id: Uuid) -> Result<R::Record, ApiError> {
        self.authorize()?;
        Self::require_soft_delete("restore")?;

        let existing = self
            .store
            .find_by_id(id, true)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("{} {id}", R::NAME)))?;
        if existing.deleted_at().is_none() {
            return Ok(existing);
        }

        let record = self.store.set_deleted_at(id, None).await?;

        tracing::info!(
            model = R::NAME,
            action = "restore",
            %id,
            user_id = ?self.caller_id(),
            correlation_id = ?self.correlation_id,
            "record restored"
        );
        Ok(record)
    }

    /// Remove a record permanently
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` for unknown ids, `CONFLICT` if other rows reference it
    pub async fn hard_delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.authorize()?;

        tracing::warn!(
            model = R::NAME,
            action = "hard_delete",
            %id,
            user_id = ?self.caller_id(),
            correlation_id = ?self.correlation_id,
            "deleting record permanently"
        );

        if self.store.delete(id).await? {
            Ok(())
        } else {
            Err(ApiError::not_found(format!("{} {id}", R::NAME)))
        }
    }

    /// Delete per the resource's policy
    ///
    /// # Errors
    ///
    /// See [`soft_delete`](Self::soft_delete) and [`hard_delete`](Self::hard_delete)
    pub async fn delete(&self, id: Uuid) -> Result<DeleteOutput, ApiError> {
        if R::SOFT_DELETE {
            self.soft_delete(id).await?;
        } else {
            self.hard_delete(id).await?;
        }
        Ok(DeleteOutput { success: true, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resource::{CreateInput, Record, UpdateData};
    use crate::store::{ListFilter, MemoryStore, StoreError, StoreRegistry};
    use async_trait::async_trait;
    use chrono::DateTime;
    use mockall::mock;
    use proptest::prelude::*;

    struct Widget;

    impl Resource for Widget {
        type Record = Record;
        const NAME: &'static str = "Widget";
        const PATH: &'static str = "widget";
        const TABLE: &'static str = "widgets";
        const ACCESS: AccessTier = AccessTier::Protected;
        const SOFT_DELETE: bool = true;
        const SEARCH_FIELDS: &'static [&'static str] = &["name", "description"];
    }

    struct Ledger;

    impl Resource for Ledger {
        type Record = Record;
        const NAME: &'static str = "Ledger";
        const PATH: &'static str = "ledger";
        const TABLE: &'static str = "ledgers";
        const ACCESS: AccessTier = AccessTier::Admin;
        const SOFT_DELETE: bool = false;
        const SEARCH_FIELDS: &'static [&'static str] = &["name"];
    }

    mock! {
        WidgetStore {}

        #[async_trait]
        impl Store<Widget> for WidgetStore {
            async fn find_many(&self, query: &ListQuery) -> Result<Vec<Record>, StoreError>;
            async fn count(&self, filter: &ListFilter) -> Result<u64, StoreError>;
            async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> Result<Option<Record>, StoreError>;
            async fn insert(&self, id: Uuid, input: CreateInput, now: DateTime<Utc>) -> Result<Record, StoreError>;
            async fn update(&self, id: Uuid, patch: UpdateData, now: DateTime<Utc>) -> Result<Record, StoreError>;
            async fn set_deleted_at(&self, id: Uuid, at: Option<DateTime<Utc>>) -> Result<Record, StoreError>;
            async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
        }
    }

    fn context_with<R: Resource>(store: Arc<dyn Store<R>>) -> Context {
        Context::new(Arc::new(StoreRegistry::new().with::<R>(store)))
    }

    fn user_service(store: MockWidgetStore) -> CrudService<Widget> {
        let ctx = context_with::<Widget>(Arc::new(store)).with_caller(Caller::user("u-1"));
        CrudService::new(&ctx).unwrap()
    }

    fn memory_context<R: Resource>(caller: Option<Caller>) -> Context {
        let ctx = context_with::<R>(Arc::new(MemoryStore::<R>::new()));
        match caller {
            Some(caller) => ctx.with_caller(caller),
            None => ctx,
        }
    }

    #[tokio::test]
    async fn test_list_queries_offset_and_row_cap() {
        let mut store = MockWidgetStore::new();
        store
            .expect_find_many()
            .withf(|q: &ListQuery| q.offset == 10 && q.limit == 10 && !q.filter.include_deleted)
            .times(1)
            .returning(|_| Ok(Vec::new()));
        store.expect_count().times(1).returning(|_| Ok(25));

        let output = user_service(store).list(ListInput::page(2, 10)).await.unwrap();
        assert_eq!(output.pagination.total, 25);
        assert_eq!(output.pagination.total_pages, 3);
        assert_eq!(output.pagination.page, 2);
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_range_without_querying() {
        let mut store = MockWidgetStore::new();
        store.expect_find_many().never();
        store.expect_count().never();
        let service = user_service(store);

        for input in [ListInput::page(0, 10), ListInput::page(1, 0), ListInput::page(1, 101)] {
            let err = service.list(input).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationError);
        }
    }

    #[tokio::test]
    async fn test_list_trims_search_and_ignores_include_deleted_for_users() {
        let mut store = MockWidgetStore::new();
        store
            .expect_find_many()
            .withf(|q: &ListQuery| {
                q.filter.search.as_deref() == Some("bolt") && !q.filter.include_deleted
            })
            .returning(|_| Ok(Vec::new()));
        store.expect_count().returning(|_| Ok(0));

        let input = ListInput {
            search: Some("  bolt ".to_string()),
            include_deleted: true,
            ..ListInput::default()
        };
        let output = user_service(store).list(input).await.unwrap();
        assert_eq!(output.pagination.total_pages, 0);
    }

    #[tokio::test]
    async fn test_blank_search_is_no_filter() {
        let mut store = MockWidgetStore::new();
        store
            .expect_find_many()
            .withf(|q: &ListQuery| q.filter.search.is_none())
            .returning(|_| Ok(Vec::new()));
        store.expect_count().returning(|_| Ok(0));

        let input = ListInput {
            search: Some("   ".to_string()),
            ..ListInput::default()
        };
        assert!(user_service(store).list(input).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_maps_unique_violation_to_conflict() {
        let mut store = MockWidgetStore::new();
        store
            .expect_insert()
            .returning(|_, _, _| Err(StoreError::UniqueViolation("widgets_name_key".into())));

        let err = user_service(store)
            .create(CreateInput::named("Bolt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_create_validates_before_writing() {
        let mut store = MockWidgetStore::new();
        store.expect_insert().never();

        let err = user_service(store)
            .create(CreateInput::named(""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_update_checks_existence_first() {
        let mut store = MockWidgetStore::new();
        store.expect_find_by_id().returning(|_, _| Ok(None));
        store.expect_update().never();

        let err = user_service(store)
            .update(Uuid::new_v4(), UpdateData::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let mut store = MockWidgetStore::new();
        store
            .expect_find_by_id()
            .returning(|_, _| Err(StoreError::Other("connection reset".into())));

        let err = user_service(store).get(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
    }

    #[tokio::test]
    async fn test_access_tiers() {
        let anonymous = CrudService::<Widget>::new(&memory_context::<Widget>(None)).unwrap();
        let err = anonymous.list(ListInput::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let user =
            CrudService::<Ledger>::new(&memory_context::<Ledger>(Some(Caller::user("u")))).unwrap();
        let err = user.list(ListInput::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let admin =
            CrudService::<Ledger>::new(&memory_context::<Ledger>(Some(Caller::admin("a")))).unwrap();
        assert!(admin.list(ListInput::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_store_is_internal() {
        let ctx = Context::new(Arc::new(StoreRegistry::new()));
        let err = CrudService::<Widget>::new(&ctx).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InternalError);
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore_are_idempotent() {
        let ctx = memory_context::<Widget>(Some(Caller::user("u")));
        let service = CrudService::<Widget>::new(&ctx).unwrap();
        let record = service.create(CreateInput::named("Bolt")).await.unwrap();

        let deleted = service.soft_delete(record.id).await.unwrap();
        let stamp = deleted.deleted_at.unwrap();
        let again = service.soft_delete(record.id).await.unwrap();
        assert_eq!(again.deleted_at, Some(stamp));

        let err = service.get(record.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(service.list(ListInput::default()).await.unwrap().items.len(), 0);

        let restored = service.restore(record.id).await.unwrap();
        assert!(restored.deleted_at.is_none());
        assert!(service.restore(record.id).await.unwrap().deleted_at.is_none());
        assert_eq!(service.get(record.id).await.unwrap().name, "Bolt");
    }

    #[tokio::test]
    async fn test_admin_sees_soft_deleted() {
        let ctx = memory_context::<Widget>(Some(Caller::admin("a")));
        let service = CrudService::<Widget>::new(&ctx).unwrap();
        let record = service.create(CreateInput::named("Bolt")).await.unwrap();
        service.delete(record.id).await.unwrap();

        assert!(service.get(record.id).await.unwrap().deleted_at.is_some());

        let hidden = service.list(ListInput::default()).await.unwrap();
        assert_eq!(hidden.pagination.total, 0);

        let shown = service
            .list(ListInput {
                include_deleted: true,
                ..ListInput::default()
            })
            .await
            .unwrap();
        assert_eq!(shown.pagination.total, 1);
    }

    #[tokio::test]
    async fn test_hard_delete_resources() {
        let ctx = memory_context::<Ledger>(Some(Caller::admin("a")));
        let service = CrudService::<Ledger>::new(&ctx).unwrap();
        let record = service.create(CreateInput::named("Q1")).await.unwrap();

        let err = service.soft_delete(record.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);

        let output = service.delete(record.id).await.unwrap();
        assert_eq!(output, DeleteOutput { success: true, id: record.id });

        let err = service.delete(record.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_echoes_input_and_assigns_server_fields() {
        let ctx = memory_context::<Widget>(Some(Caller::user("u")));
        let service = CrudService::<Widget>::new(&ctx).unwrap();
        let input = CreateInput {
            name: "Bolt".to_string(),
            description: Some("M6".to_string()),
            email: Some("parts@example.com".to_string()),
            status: "DRAFT".to_string(),
        };

        let record = service.create(input.clone()).await.unwrap();
        assert_eq!(record.name, input.name);
        assert_eq!(record.description, input.description);
        assert_eq!(record.email, input.email);
        assert_eq!(record.status, input.status);
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.deleted_at.is_none());

        let updated = service
            .update(
                record.id,
                UpdateData {
                    description: Some(None),
                    ..UpdateData::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.description.is_none());
        assert!(updated.updated_at >= record.updated_at);
    }

    proptest! {
        #[test]
        fn prop_page_never_exceeds_limit(total in 0usize..60, page in 1u32..8, limit in 1u32..=100) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let ctx = memory_context::<Widget>(Some(Caller::user("u")));
                let service = CrudService::<Widget>::new(&ctx).unwrap();
                for i in 0..total {
                    service.create(CreateInput::named(format!("item-{i}"))).await.unwrap();
                }

                let output = service.list(ListInput::page(page, limit)).await.unwrap();
                let total = total as u64;
                let limit64 = u64::from(limit);
                prop_assert!(output.items.len() as u64 <= limit64);
                prop_assert_eq!(output.pagination.total, total);
                prop_assert_eq!(output.pagination.total_pages, total.div_ceil(limit64));

                let expected = total
                    .saturating_sub(u64::from(page - 1) * limit64)
                    .min(limit64);
                prop_assert_eq!(output.items.len() as u64, expected);
                Ok(())
            })?;
        }
    }
}
