//! PostgreSQL store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{FromRow, QueryBuilder};
use std::marker::PhantomData;
use tracing::instrument;
use uuid::Uuid;

use super::{escape_like, ListFilter, ListQuery, Store, StoreError};
use crate::resource::{Columns, CreateOf, FieldValue, Resource, UpdateOf};

/// [`Store`] backed by a table named `R::TABLE`
///
/// The table must have `id uuid primary key`, `created_at` and `updated_at`
/// timestamps, one column per input field, and `deleted_at` when the resource
/// soft-deletes.
pub struct PgStore<R> {
    pool: PgPool,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for PgStore<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> PgStore<R> {
    /// Store using a shared pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _resource: PhantomData,
        }
    }

    fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &ListFilter) {
        if R::SOFT_DELETE && !filter.include_deleted {
            query.push(" AND deleted_at IS NULL");
        }

        if let Some(search) = &filter.search {
            if !R::SEARCH_FIELDS.is_empty() {
                let pattern = format!("%{}%", escape_like(search));
                query.push(" AND (");
                for (i, field) in R::SEARCH_FIELDS.iter().enumerate() {
                    if i > 0 {
                        query.push(" OR ");
                    }
                    query.push(format!("{field} ILIKE "));
                    query.push_bind(pattern.clone());
                }
                query.push(")");
            }
        }
    }
}

fn push_value(query: &mut QueryBuilder<'_, Postgres>, value: FieldValue) {
    match value {
        FieldValue::Text(v) => query.push_bind(v),
        FieldValue::Bool(v) => query.push_bind(v),
        FieldValue::Int(v) => query.push_bind(v),
        FieldValue::Timestamp(v) => query.push_bind(v),
    };
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl<R> Store<R> for PgStore<R>
where
    R: Resource,
    R::Record: for<'r> FromRow<'r, PgRow>,
{
    #[instrument(skip(self, query), fields(table = R::TABLE, offset = query.offset, limit = query.limit), err)]
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<R::Record>, StoreError> {
        let mut sql = QueryBuilder::new(format!("SELECT * FROM {} WHERE 1=1", R::TABLE));
        Self::push_filter(&mut sql, &query.filter);

        let direction = query.sort_order.as_sql();
        sql.push(format!(
            " ORDER BY {} {direction}, id {direction} LIMIT ",
            query.sort_by.column()
        ));
        sql.push_bind(to_i64(query.limit));
        sql.push(" OFFSET ");
        sql.push_bind(to_i64(query.offset));

        let rows = sql
            .build_query_as::<R::Record>()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = rows.len(), "fetched page");
        Ok(rows)
    }

    #[instrument(skip(self, filter), fields(table = R::TABLE), err)]
    async fn count(&self, filter: &ListFilter) -> Result<u64, StoreError> {
        let mut sql = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE 1=1", R::TABLE));
        Self::push_filter(&mut sql, filter);

        let count: i64 = sql.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    #[instrument(skip(self), fields(table = R::TABLE), err)]
    async fn find_by_id(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<R::Record>, StoreError> {
        let mut sql = QueryBuilder::new(format!("SELECT * FROM {} WHERE id = ", R::TABLE));
        sql.push_bind(id);
        if R::SOFT_DELETE && !include_deleted {
            sql.push(" AND deleted_at IS NULL");
        }

        Ok(sql
            .build_query_as::<R::Record>()
            .fetch_optional(&self.pool)
            .await?)
    }

    #[instrument(skip(self, input), fields(table = R::TABLE), err)]
    async fn insert(
        &self,
        id: Uuid,
        input: CreateOf<R>,
        now: DateTime<Utc>,
    ) -> Result<R::Record, StoreError> {
        let columns = input.columns();

        let mut sql = QueryBuilder::new(format!("INSERT INTO {} (id", R::TABLE));
        for (name, _) in &columns {
            sql.push(format!(", {name}"));
        }
        sql.push(", created_at, updated_at) VALUES (");
        sql.push_bind(id);
        for (_, value) in columns {
            sql.push(", ");
            push_value(&mut sql, value);
        }
        sql.push(", ");
        sql.push_bind(now);
        sql.push(", ");
        sql.push_bind(now);
        sql.push(") RETURNING *");

        Ok(sql
            .build_query_as::<R::Record>()
            .fetch_one(&self.pool)
            .await?)
    }

    #[instrument(skip(self, patch), fields(table = R::TABLE), err)]
    async fn update(
        &self,
        id: Uuid,
        patch: UpdateOf<R>,
        now: DateTime<Utc>,
    ) -> Result<R::Record, StoreError> {
        let mut sql = QueryBuilder::new(format!("UPDATE {} SET updated_at = ", R::TABLE));
        sql.push_bind(now);
        for (name, value) in patch.columns() {
            sql.push(format!(", {name} = "));
            push_value(&mut sql, value);
        }
        sql.push(" WHERE id = ");
        sql.push_bind(id);
        sql.push(" RETURNING *");

        sql.build_query_as::<R::Record>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::RowNotFound)
    }

    #[instrument(skip(self), fields(table = R::TABLE), err)]
    async fn set_deleted_at(
        &self,
        id: Uuid,
        at: Option<DateTime<Utc>>,
    ) -> Result<R::Record, StoreError> {
        let mut sql = QueryBuilder::new(format!("UPDATE {} SET deleted_at = ", R::TABLE));
        sql.push_bind(at);
        sql.push(" WHERE id = ");
        sql.push_bind(id);
        sql.push(" RETURNING *");

        sql.build_query_as::<R::Record>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::RowNotFound)
    }

    #[instrument(skip(self), fields(table = R::TABLE), err)]
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut sql = QueryBuilder::new(format!("DELETE FROM {} WHERE id = ", R::TABLE));
        sql.push_bind(id);

        let result = sql.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
