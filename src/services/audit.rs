// src/services/audit.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{record::Record, store::Snapshot},
    models::{
        audit::{AuditAction, ChangeRecord},
        auth::Principal,
    },
};

/// Onde os registros de alteração são gravados.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: &ChangeRecord) -> Result<(), AppError>;
}

fn empty() -> Value {
    Value::Object(Map::new())
}

// Cópia estrutural do estado no momento do registro
fn snapshot<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|error| {
        tracing::warn!(%error, "Não foi possível serializar o snapshot de auditoria");
        empty()
    })
}

/// Registros acumulados durante uma transação.
#[derive(Debug)]
pub struct AuditTrail {
    company_id: Uuid,
    actor_id: Uuid,
    records: Vec<ChangeRecord>,
}

impl AuditTrail {
    pub fn new(company_id: Uuid, actor_id: Uuid) -> Self {
        Self { company_id, actor_id, records: Vec::new() }
    }

    pub fn for_principal(principal: &Principal) -> Self {
        Self::new(principal.company_id, principal.id)
    }

    pub fn record(
        &mut self,
        table: &str,
        record_id: Uuid,
        action: AuditAction,
        previous: Value,
        new: Value,
    ) {
        self.records.push(ChangeRecord {
            id: Uuid::new_v4(),
            company_id: Some(self.company_id),
            actor_id: Some(self.actor_id),
            table_name: table.to_string(),
            record_id,
            action,
            previous_data: previous,
            new_data: new,
            created_at: Utc::now(),
        });
    }

    pub fn inserted<R: Record>(&mut self, row: &R) {
        self.record(R::TABLE, row.id(), AuditAction::Insert, empty(), snapshot(row));
    }

    pub fn updated<R: Record>(&mut self, previous: &R, current: &R) {
        self.record(
            R::TABLE,
            current.id(),
            AuditAction::Update,
            snapshot(previous),
            snapshot(current),
        );
    }

    pub fn deleted<R: Record>(&mut self, previous: &R) {
        self.record(R::TABLE, previous.id(), AuditAction::Delete, snapshot(previous), empty());
    }

    pub fn removed(&mut self, table: &str, removed: Snapshot) {
        self.record(table, removed.id, AuditAction::Delete, removed.snapshot, empty());
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ChangeRecord> {
        self.records
    }
}

/// Grava registros de alteração sem nunca falhar quem chamou.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
}

impl AuditLogger {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub async fn log_action(&self, record: &ChangeRecord) {
        if let Err(error) = self.sink.append(record).await {
            tracing::error!(
                table = %record.table_name,
                record_id = %record.record_id,
                action = ?record.action,
                error = %error,
                "❌ Falha ao gravar registro de auditoria"
            );
        }
    }

    /// Chamado depois do commit.
    pub async fn flush(&self, trail: AuditTrail) {
        for record in trail.into_records() {
            self.log_action(&record).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{memory::RecordingSink, record::RowMeta},
        models::security::SecurityGroup,
    };

    fn group(name: &str) -> SecurityGroup {
        let meta = RowMeta::fresh(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
        SecurityGroup {
            id: meta.id,
            company_id: meta.company_id,
            name: name.into(),
            description: String::new(),
            stamps: meta.stamps,
        }
    }

    #[test]
    fn actions_carry_the_expected_snapshots() {
        let mut trail = AuditTrail::new(Uuid::new_v4(), Uuid::new_v4());
        let before = group("Ops");
        let mut after = before.clone();
        after.name = "Operações".into();

        trail.inserted(&before);
        trail.updated(&before, &after);
        trail.deleted(&after);

        let records = trail.records();
        assert_eq!(records[0].action, AuditAction::Insert);
        assert_eq!(records[0].previous_data, empty());
        assert_eq!(records[0].new_data["name"], "Ops");

        assert_eq!(records[1].action, AuditAction::Update);
        assert_eq!(records[1].previous_data["name"], "Ops");
        assert_eq!(records[1].new_data["name"], "Operações");

        assert_eq!(records[2].action, AuditAction::Delete);
        assert_eq!(records[2].new_data, empty());
        assert!(records.iter().all(|r| r.table_name == "security_groups"));
    }

    #[test]
    fn snapshot_is_detached_from_the_row() {
        let mut trail = AuditTrail::new(Uuid::new_v4(), Uuid::new_v4());
        let mut row = group("Ops");

        trail.inserted(&row);
        row.name = "Alterado".into();

        assert_eq!(trail.records()[0].new_data["name"], "Ops");
    }

    #[tokio::test]
    async fn sink_failures_never_reach_the_caller() {
        let logger = AuditLogger::new(Arc::new(RecordingSink::failing()));
        let mut trail = AuditTrail::new(Uuid::new_v4(), Uuid::new_v4());
        trail.inserted(&group("Ops"));

        // não deve entrar em pânico nem propagar erro
        logger.flush(trail).await;
    }

    #[tokio::test]
    async fn flush_writes_in_trail_order() {
        let sink = RecordingSink::new();
        let logger = AuditLogger::new(Arc::new(sink.clone()));
        let mut trail = AuditTrail::new(Uuid::new_v4(), Uuid::new_v4());
        let row = group("Ops");
        trail.inserted(&row);
        trail.deleted(&row);

        logger.flush(trail).await;

        let actions: Vec<AuditAction> = sink.records().iter().map(|r| r.action).collect();
        assert_eq!(actions, vec![AuditAction::Insert, AuditAction::Delete]);
    }
}
