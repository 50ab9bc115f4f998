// src/db/record.rs

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::Query,
    FromRow, Postgres,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::reconcile::Reconcilable;

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Carimbos de auditoria presentes em toda linha de tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Stamps {
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

/// Identidade e carimbos que o pipeline entrega ao montar uma linha.
#[derive(Debug, Clone)]
pub struct RowMeta {
    pub id: Uuid,
    pub company_id: Uuid,
    pub stamps: Stamps,
}

impl RowMeta {
    pub fn fresh(company_id: Uuid, actor_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            stamps: Stamps {
                created_at: now,
                created_by: Some(actor_id),
                updated_at: None,
                updated_by: None,
            },
        }
    }

    pub fn touched<R: Record>(row: &R, actor_id: Uuid, now: DateTime<Utc>) -> Self {
        let mut stamps = row.stamps().clone();
        stamps.updated_at = Some(now);
        stamps.updated_by = Some(actor_id);

        Self { id: row.id(), company_id: row.company_id(), stamps }
    }
}

/// Linhas que apagam junto com o pai, mas não são filhas diretas dele.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cascade {
    /// `DELETE FROM table WHERE column = <pai>`
    Direct { table: &'static str, column: &'static str },
    /// `DELETE FROM table WHERE column IN (SELECT id FROM through WHERE through_column = <pai>)`
    Through {
        table: &'static str,
        column: &'static str,
        through: &'static str,
        through_column: &'static str,
    },
}

impl Cascade {
    pub fn table(&self) -> &'static str {
        match self {
            Cascade::Direct { table, .. } | Cascade::Through { table, .. } => table,
        }
    }
}

/// Uma linha de tabela com escopo de empresa.
///
/// As instruções SQL são montadas a partir de `COLUMNS` e `INSERT_ONLY`,
/// nunca a partir das chaves do payload. `bind_columns` deve fazer o bind
/// exatamente na ordem de `COLUMNS`.
pub trait Record:
    Serialize + DeserializeOwned + for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static
{
    const TABLE: &'static str;
    /// Nome legível, usado em `AppError::NotFound`.
    const ENTITY: &'static str;
    /// Colunas graváveis em insert e update.
    const COLUMNS: &'static [&'static str];
    /// Colunas gravadas só no insert.
    const INSERT_ONLY: &'static [&'static str] = &[];
    const ORDER_BY: &'static str = "created_at, id";
    /// Dependentes apagados antes das filhas, na ordem declarada.
    const DEPENDENTS: &'static [Cascade] = &[];

    fn id(&self) -> Uuid;
    fn company_id(&self) -> Uuid;
    fn stamps(&self) -> &Stamps;

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q>;

    fn bind_insert_only<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
    }
}

/// Linha pertencente a um agregado, ligada ao pai por `PARENT_COLUMN`.
pub trait ChildRecord: Record {
    const PARENT_COLUMN: &'static str;

    fn parent_id(&self) -> Uuid;
}

/// Id de outra tabela citado por um payload; precisa existir na mesma empresa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub table: &'static str,
    pub entity: &'static str,
    pub id: Uuid,
}

impl Reference {
    pub fn to<R: Record>(id: Uuid) -> Self {
        Self { table: R::TABLE, entity: R::ENTITY, id }
    }
}

pub struct Aggregate<P, C> {
    pub parent: P,
    pub children: Vec<C>,
}

/// Payload de um agregado (pai + coleção de filhas).
pub trait AggregateDraft: Send + Sized {
    type Row: Record;
    type Child: ChildDraft;

    fn take_children(&mut self) -> Vec<Self::Child>;

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// `previous` é a linha gravada, presente apenas no update.
    fn build(self, meta: RowMeta, previous: Option<&Self::Row>) -> Self::Row;
}

pub trait ChildDraft: Reconcilable + Send {
    type Row: ChildRecord;

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    fn build(self, meta: RowMeta, parent_id: Uuid) -> Self::Row;
}
