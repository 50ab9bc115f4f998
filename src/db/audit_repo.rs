// src/db/audit_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    models::audit::{AuditLogQuery, ChangeRecord},
    services::audit::AuditSink,
};

/// Tabela `change_records`: só recebe INSERT.
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, record: &ChangeRecord) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO change_records
                (id, company_id, actor_id, table_name, record_id, action, previous_data, new_data, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(record.company_id)
        .bind(record.actor_id)
        .bind(&record.table_name)
        .bind(record.record_id)
        .bind(record.action)
        .bind(&record.previous_data)
        .bind(&record.new_data)
        .bind(record.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Mais recentes primeiro, sempre filtrado pela empresa.
    pub async fn list(
        &self,
        company_id: Uuid,
        filter: &AuditLogQuery,
        page: PageRequest,
    ) -> Result<Page<ChangeRecord>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM change_records");
        push_filters(&mut count, company_id, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM change_records");
        push_filters(&mut select, company_id, filter);
        select
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build_query_as::<ChangeRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { total, rows })
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, company_id: Uuid, filter: &AuditLogQuery) {
    builder.push(" WHERE company_id = ").push_bind(company_id);

    if let Some(table) = &filter.table {
        builder.push(" AND table_name = ").push_bind(table.clone());
    }
    if let Some(record_id) = filter.record_id {
        builder.push(" AND record_id = ").push_bind(record_id);
    }
    if let Some(action) = filter.action {
        builder.push(" AND action = ").push_bind(action);
    }
}

#[async_trait]
impl AuditSink for AuditRepository {
    async fn append(&self, record: &ChangeRecord) -> Result<(), AppError> {
        self.insert(&self.pool, record).await
    }
}
