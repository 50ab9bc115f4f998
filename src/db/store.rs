// src/db/store.rs

use std::ops::DerefMut;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{pool::PoolConnection, FromRow, PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::{
        record::{Cascade, ChildRecord, Record, Reference},
        statement,
    },
};

/// Linha removida em cascata, capturada como JSON antes de sumir.
#[derive(Debug, Clone, FromRow)]
pub struct Snapshot {
    pub id: Uuid,
    pub snapshot: Value,
}

/// Operações de linha usadas pelo pipeline, sempre com escopo de empresa.
#[async_trait]
pub trait RowStore: Send {
    async fn find<R: Record>(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<R>, AppError>;

    async fn exists(&mut self, company_id: Uuid, reference: Reference) -> Result<bool, AppError>;

    async fn list<R: Record>(&mut self, company_id: Uuid) -> Result<Vec<R>, AppError>;

    async fn page<R: Record>(
        &mut self,
        company_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<R>, AppError>;

    async fn list_by<R: Record>(
        &mut self,
        company_id: Uuid,
        column: &'static str,
        value: Uuid,
    ) -> Result<Vec<R>, AppError>;

    async fn count_by<R: Record>(
        &mut self,
        company_id: Uuid,
        column: &'static str,
        value: Uuid,
    ) -> Result<i64, AppError>;

    async fn insert<R: Record>(&mut self, row: &R) -> Result<(), AppError>;

    /// `NotFound` quando nenhuma linha foi afetada.
    async fn update<R: Record>(&mut self, row: &R) -> Result<(), AppError>;

    /// `NotFound` quando nenhuma linha foi afetada.
    async fn delete<R: Record>(&mut self, company_id: Uuid, id: Uuid) -> Result<(), AppError>;

    async fn delete_by<R: Record>(
        &mut self,
        company_id: Uuid,
        column: &'static str,
        value: Uuid,
    ) -> Result<u64, AppError>;

    async fn delete_dependents(
        &mut self,
        cascade: Cascade,
        company_id: Uuid,
        parent_id: Uuid,
    ) -> Result<Vec<Snapshot>, AppError>;

    async fn children<C: ChildRecord>(
        &mut self,
        company_id: Uuid,
        parent_id: Uuid,
    ) -> Result<Vec<C>, AppError> {
        self.list_by::<C>(company_id, C::PARENT_COLUMN, parent_id).await
    }
}

#[async_trait]
pub trait StorageTx: RowStore + Sized {
    async fn commit(self) -> Result<(), AppError>;
    async fn rollback(self) -> Result<(), AppError>;
}

/// Fonte de leitores (conexão avulsa) e transações.
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    type Reader: RowStore;
    type Tx: StorageTx;

    async fn reader(&self) -> Result<Self::Reader, AppError>;
    async fn begin(&self) -> Result<Self::Tx, AppError>;
}

// --- Postgres ---

#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Conexão do pool ou transação; ambas derrefenciam para `PgConnection`.
pub struct PgSession<C> {
    conn: C,
}

pub type PgReader = PgSession<PoolConnection<Postgres>>;
pub type PgTx = PgSession<Transaction<'static, Postgres>>;

#[async_trait]
impl Storage for PgStorage {
    type Reader = PgReader;
    type Tx = PgTx;

    async fn reader(&self) -> Result<PgReader, AppError> {
        Ok(PgSession { conn: self.pool.acquire().await? })
    }

    async fn begin(&self) -> Result<PgTx, AppError> {
        Ok(PgSession { conn: self.pool.begin().await? })
    }
}

#[async_trait]
impl StorageTx for PgTx {
    async fn commit(self) -> Result<(), AppError> {
        // Restrições DEFERRABLE só disparam aqui
        self.conn.commit().await.map_err(AppError::from_db)
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.conn.rollback().await.map_err(AppError::from_db)
    }
}

#[async_trait]
impl<C> RowStore for PgSession<C>
where
    C: DerefMut<Target = PgConnection> + Send,
{
    async fn find<R: Record>(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<R>, AppError> {
        let sql = statement::select_one::<R>();
        sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(AppError::from_db)
    }

    async fn exists(&mut self, company_id: Uuid, reference: Reference) -> Result<bool, AppError> {
        let sql = statement::exists(reference.table);
        sqlx::query_scalar(&sql)
            .bind(reference.id)
            .bind(company_id)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(AppError::from_db)
    }

    async fn list<R: Record>(&mut self, company_id: Uuid) -> Result<Vec<R>, AppError> {
        let sql = statement::select_all::<R>();
        sqlx::query_as::<_, R>(&sql)
            .bind(company_id)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(AppError::from_db)
    }

    async fn page<R: Record>(
        &mut self,
        company_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<R>, AppError> {
        let count_sql = statement::count_all::<R>();
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(company_id)
            .fetch_one(&mut *self.conn)
            .await?;

        let page_sql = statement::select_page::<R>();
        let rows = sqlx::query_as::<_, R>(&page_sql)
            .bind(company_id)
            .bind(request.limit())
            .bind(request.offset())
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(Page { total, rows })
    }

    async fn list_by<R: Record>(
        &mut self,
        company_id: Uuid,
        column: &'static str,
        value: Uuid,
    ) -> Result<Vec<R>, AppError> {
        let sql = statement::select_by::<R>(column);
        sqlx::query_as::<_, R>(&sql)
            .bind(company_id)
            .bind(value)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(AppError::from_db)
    }

    async fn count_by<R: Record>(
        &mut self,
        company_id: Uuid,
        column: &'static str,
        value: Uuid,
    ) -> Result<i64, AppError> {
        let sql = statement::count_by::<R>(column);
        sqlx::query_scalar(&sql)
            .bind(company_id)
            .bind(value)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(AppError::from_db)
    }

    async fn insert<R: Record>(&mut self, row: &R) -> Result<(), AppError> {
        let sql = statement::insert::<R>();
        let stamps = row.stamps().clone();

        let query = sqlx::query(&sql).bind(row.id()).bind(row.company_id());
        let query = row.bind_columns(query);
        let query = row.bind_insert_only(query);

        query
            .bind(stamps.created_at)
            .bind(stamps.created_by)
            .execute(&mut *self.conn)
            .await
            .map_err(AppError::from_db)?;

        Ok(())
    }

    async fn update<R: Record>(&mut self, row: &R) -> Result<(), AppError> {
        let sql = statement::update::<R>();
        let stamps = row.stamps().clone();

        let query = sqlx::query(&sql).bind(row.id()).bind(row.company_id());
        let result = row
            .bind_columns(query)
            .bind(stamps.updated_at)
            .bind(stamps.updated_by)
            .execute(&mut *self.conn)
            .await
            .map_err(AppError::from_db)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(R::ENTITY));
        }
        Ok(())
    }

    async fn delete<R: Record>(&mut self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let sql = statement::delete_one::<R>();
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(company_id)
            .execute(&mut *self.conn)
            .await
            .map_err(AppError::from_db)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(R::ENTITY));
        }
        Ok(())
    }

    async fn delete_by<R: Record>(
        &mut self,
        company_id: Uuid,
        column: &'static str,
        value: Uuid,
    ) -> Result<u64, AppError> {
        let sql = statement::delete_by::<R>(column);
        let result = sqlx::query(&sql)
            .bind(company_id)
            .bind(value)
            .execute(&mut *self.conn)
            .await
            .map_err(AppError::from_db)?;

        Ok(result.rows_affected())
    }

    async fn delete_dependents(
        &mut self,
        cascade: Cascade,
        company_id: Uuid,
        parent_id: Uuid,
    ) -> Result<Vec<Snapshot>, AppError> {
        let sql = statement::delete_dependents(&cascade);
        sqlx::query_as::<_, Snapshot>(&sql)
            .bind(company_id)
            .bind(parent_id)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(AppError::from_db)
    }
}
