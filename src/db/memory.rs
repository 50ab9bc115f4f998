// src/db/memory.rs
//
// Armazenamento em memória para os testes de serviço. Cada tabela é uma
// lista de linhas JSON; a transação trabalha numa cópia e só publica no commit.

use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::{
        record::{Cascade, Record, Reference},
        store::{RowStore, Snapshot, Storage, StorageTx},
    },
    models::audit::ChangeRecord,
    services::audit::AuditSink,
};

type Tables = BTreeMap<&'static str, Vec<Value>>;

#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<Mutex<Tables>>,
    fail_on: Option<&'static str>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesma base, mas qualquer insert em `table` falha.
    pub fn failing_on(&self, table: &'static str) -> Self {
        Self { tables: self.tables.clone(), fail_on: Some(table) }
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .expect("tabelas em memória envenenadas")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Linha mínima (id + empresa), suficiente para satisfazer uma referência.
    pub fn seed(&self, table: &'static str, company_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.tables
            .lock()
            .expect("tabelas em memória envenenadas")
            .entry(table)
            .or_default()
            .push(json!({ "id": id, "company_id": company_id }));
        id
    }

    fn snapshot(&self) -> Tables {
        self.tables.lock().expect("tabelas em memória envenenadas").clone()
    }
}

pub struct MemoryTx {
    staged: Tables,
    origin: Arc<Mutex<Tables>>,
    fail_on: Option<&'static str>,
}

#[async_trait]
impl Storage for MemoryStorage {
    type Reader = MemoryTx;
    type Tx = MemoryTx;

    async fn reader(&self) -> Result<MemoryTx, AppError> {
        Ok(MemoryTx { staged: self.snapshot(), origin: self.tables.clone(), fail_on: None })
    }

    async fn begin(&self) -> Result<MemoryTx, AppError> {
        Ok(MemoryTx { staged: self.snapshot(), origin: self.tables.clone(), fail_on: self.fail_on })
    }
}

#[async_trait]
impl StorageTx for MemoryTx {
    async fn commit(self) -> Result<(), AppError> {
        *self.origin.lock().expect("tabelas em memória envenenadas") = self.staged;
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        Ok(())
    }
}

fn uuid_value(id: Uuid) -> Value {
    json!(id)
}

fn scoped(row: &Value, company_id: Uuid) -> bool {
    row.get("company_id") == Some(&uuid_value(company_id))
}

fn has(row: &Value, column: &str, value: Uuid) -> bool {
    row.get(column) == Some(&uuid_value(value))
}

fn decode<R: Record>(row: &Value) -> Result<R, AppError> {
    serde_json::from_value(row.clone()).map_err(|e| AppError::InternalServerError(e.into()))
}

fn encode<R: Record>(row: &R) -> Result<Value, AppError> {
    serde_json::to_value(row).map_err(|e| AppError::InternalServerError(e.into()))
}

impl MemoryTx {
    fn table(&mut self, name: &'static str) -> &mut Vec<Value> {
        self.staged.entry(name).or_default()
    }

    fn remove_where(&mut self, name: &'static str, keep: impl Fn(&Value) -> bool) -> Vec<Value> {
        let (kept, removed): (Vec<Value>, Vec<Value>) =
            std::mem::take(self.table(name)).into_iter().partition(|row| keep(row));
        *self.table(name) = kept;
        removed
    }
}

#[async_trait]
impl RowStore for MemoryTx {
    async fn find<R: Record>(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<R>, AppError> {
        self.table(R::TABLE)
            .iter()
            .find(|row| has(row, "id", id) && scoped(row, company_id))
            .map(decode::<R>)
            .transpose()
    }

    async fn exists(&mut self, company_id: Uuid, reference: Reference) -> Result<bool, AppError> {
        Ok(self
            .table(reference.table)
            .iter()
            .any(|row| has(row, "id", reference.id) && scoped(row, company_id)))
    }

    async fn list<R: Record>(&mut self, company_id: Uuid) -> Result<Vec<R>, AppError> {
        self.table(R::TABLE)
            .iter()
            .filter(|row| scoped(row, company_id))
            .map(decode::<R>)
            .collect()
    }

    async fn page<R: Record>(
        &mut self,
        company_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<R>, AppError> {
        let all: Vec<R> = self.list(company_id).await?;
        let total = all.len() as i64;
        let rows = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Ok(Page { total, rows })
    }

    async fn list_by<R: Record>(
        &mut self,
        company_id: Uuid,
        column: &'static str,
        value: Uuid,
    ) -> Result<Vec<R>, AppError> {
        self.table(R::TABLE)
            .iter()
            .filter(|row| scoped(row, company_id) && has(row, column, value))
            .map(decode::<R>)
            .collect()
    }

    async fn count_by<R: Record>(
        &mut self,
        company_id: Uuid,
        column: &'static str,
        value: Uuid,
    ) -> Result<i64, AppError> {
        Ok(self
            .table(R::TABLE)
            .iter()
            .filter(|row| scoped(row, company_id) && has(row, column, value))
            .count() as i64)
    }

    async fn insert<R: Record>(&mut self, row: &R) -> Result<(), AppError> {
        if self.fail_on == Some(R::TABLE) {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "falha simulada em {}",
                R::TABLE
            )));
        }
        let value = encode(row)?;
        self.table(R::TABLE).push(value);
        Ok(())
    }

    async fn update<R: Record>(&mut self, row: &R) -> Result<(), AppError> {
        let value = encode(row)?;
        let (id, company_id) = (row.id(), row.company_id());
        match self
            .table(R::TABLE)
            .iter_mut()
            .find(|stored| has(stored, "id", id) && scoped(stored, company_id))
        {
            Some(stored) => {
                *stored = value;
                Ok(())
            }
            None => Err(AppError::NotFound(R::ENTITY)),
        }
    }

    async fn delete<R: Record>(&mut self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let removed =
            self.remove_where(R::TABLE, |row| !(has(row, "id", id) && scoped(row, company_id)));
        if removed.is_empty() {
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
        let removed = self
            .remove_where(R::TABLE, |row| !(scoped(row, company_id) && has(row, column, value)));
        Ok(removed.len() as u64)
    }

    async fn delete_dependents(
        &mut self,
        cascade: Cascade,
        company_id: Uuid,
        parent_id: Uuid,
    ) -> Result<Vec<Snapshot>, AppError> {
        let removed = match cascade {
            Cascade::Direct { table, column } => self
                .remove_where(table, |row| !(scoped(row, company_id) && has(row, column, parent_id))),
            Cascade::Through { table, column, through, through_column } => {
                let owners: HashSet<String> = self
                    .table(through)
                    .iter()
                    .filter(|row| scoped(row, company_id) && has(row, through_column, parent_id))
                    .filter_map(|row| row.get("id").and_then(Value::as_str).map(String::from))
                    .collect();
                self.remove_where(table, |row| {
                    !(scoped(row, company_id)
                        && row
                            .get(column)
                            .and_then(Value::as_str)
                            .is_some_and(|owner| owners.contains(owner)))
                })
            }
        };

        Ok(removed
            .into_iter()
            .map(|row| {
                let id = row
                    .get("id")
                    .and_then(Value::as_str)
                    .and_then(|id| Uuid::parse_str(id).ok())
                    .unwrap_or_default();
                Snapshot { id, snapshot: row }
            })
            .collect())
    }
}

/// Destino de auditoria que só guarda os registros (ou falha sempre).
#[derive(Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<ChangeRecord>>>,
    failing: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub fn records(&self) -> Vec<ChangeRecord> {
        self.records.lock().expect("registros envenenados").clone()
    }
}

#[async_trait]
impl AuditSink for RecordingSink {
    async fn append(&self, record: &ChangeRecord) -> Result<(), AppError> {
        if self.failing {
            return Err(AppError::InternalServerError(anyhow::anyhow!("destino de auditoria indisponível")));
        }
        self.records.lock().expect("registros envenenados").push(record.clone());
        Ok(())
    }
}
