// src/services/pipeline.rs
//
// Formato único de escrita dos agregados (pai + filhas): uma transação,
// reconciliação das filhas e auditoria publicada só depois do commit.

use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::{
        record::{Aggregate, AggregateDraft, ChildDraft, ChildRecord, Record, Reference, RowMeta},
        store::{PgStorage, RowStore, Storage, StorageTx},
    },
    models::auth::Principal,
    services::{
        audit::{AuditLogger, AuditTrail},
        reconcile::{self, Reconcilable},
    },
};

type ChildRow<P> = <<P as AggregateDraft>::Child as ChildDraft>::Row;

fn references_of<P: AggregateDraft>(draft: &P, children: &[P::Child]) -> Vec<Reference> {
    let mut references = draft.references();
    references.extend(children.iter().flat_map(|child| child.references()));
    references
}

#[derive(Clone)]
pub struct MutationPipeline<D: Storage = PgStorage> {
    db: D,
    audit: AuditLogger,
}

impl<D: Storage> MutationPipeline<D> {
    pub fn new(db: D, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    pub async fn begin(&self, principal: &Principal) -> Result<Mutation<'_, D::Tx>, AppError> {
        let tx = self.db.begin().await?;
        Ok(Mutation {
            tx,
            trail: AuditTrail::for_principal(principal),
            audit: &self.audit,
            company_id: principal.company_id,
            actor_id: principal.id,
        })
    }

    pub async fn create<P: AggregateDraft>(
        &self,
        principal: &Principal,
        draft: P,
    ) -> Result<Aggregate<P::Row, ChildRow<P>>, AppError> {
        let mut mutation = self.begin(principal).await?;
        let result = mutation.insert_aggregate(draft).await;
        mutation.settle(result).await
    }

    pub async fn update<P: AggregateDraft>(
        &self,
        principal: &Principal,
        id: Uuid,
        draft: P,
    ) -> Result<Aggregate<P::Row, ChildRow<P>>, AppError> {
        let mut mutation = self.begin(principal).await?;
        let result = mutation.update_aggregate(id, draft).await;
        mutation.settle(result).await
    }

    pub async fn delete<P: Record, C: ChildRecord>(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<(), AppError> {
        let mut mutation = self.begin(principal).await?;
        let result = mutation.delete_aggregate::<P, C>(id).await;
        mutation.settle(result).await
    }

    pub async fn fetch<P: Record, C: ChildRecord>(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<Aggregate<P, C>, AppError> {
        let mut reader = self.db.reader().await?;
        let parent = reader
            .find::<P>(principal.company_id, id)
            .await?
            .ok_or(AppError::NotFound(P::ENTITY))?;
        let children = reader.children::<C>(principal.company_id, id).await?;

        Ok(Aggregate { parent, children })
    }

    pub async fn exists<R: Record>(&self, principal: &Principal, id: Uuid) -> Result<bool, AppError> {
        let mut reader = self.db.reader().await?;
        Ok(reader.find::<R>(principal.company_id, id).await?.is_some())
    }

    pub async fn list<R: Record>(&self, principal: &Principal) -> Result<Vec<R>, AppError> {
        let mut reader = self.db.reader().await?;
        reader.list::<R>(principal.company_id).await
    }

    pub async fn list_by<R: Record>(
        &self,
        principal: &Principal,
        column: &'static str,
        value: Uuid,
    ) -> Result<Vec<R>, AppError> {
        let mut reader = self.db.reader().await?;
        reader.list_by::<R>(principal.company_id, column, value).await
    }

    pub async fn paginate<R: Record>(
        &self,
        principal: &Principal,
        request: PageRequest,
    ) -> Result<Page<R>, AppError> {
        let mut reader = self.db.reader().await?;
        reader.page::<R>(principal.company_id, request).await
    }
}

/// Transação aberta com a trilha de auditoria que a acompanha.
pub struct Mutation<'a, T: StorageTx> {
    tx: T,
    trail: AuditTrail,
    audit: &'a AuditLogger,
    company_id: Uuid,
    actor_id: Uuid,
}

impl<T: StorageTx> Mutation<'_, T> {
    pub fn company_id(&self) -> Uuid {
        self.company_id
    }

    pub fn store(&mut self) -> &mut T {
        &mut self.tx
    }

    /// Cada id citado precisa existir na empresa da transação.
    async fn check_references(&mut self, references: Vec<Reference>) -> Result<(), AppError> {
        let mut checked = HashSet::new();
        for reference in references {
            if !checked.insert((reference.table, reference.id)) {
                continue;
            }
            if !self.tx.exists(self.company_id, reference).await? {
                return Err(AppError::NotFound(reference.entity));
            }
        }
        Ok(())
    }

    /// Commit e auditoria em caso de sucesso; rollback em caso de erro.
    pub async fn settle<V>(self, result: Result<V, AppError>) -> Result<V, AppError> {
        match result {
            Ok(value) => {
                self.tx.commit().await?;
                self.audit.flush(self.trail).await;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = self.tx.rollback().await {
                    tracing::error!(error = %rollback_error, "Falha no rollback da transação");
                }
                Err(error)
            }
        }
    }

    pub async fn insert_aggregate<P: AggregateDraft>(
        &mut self,
        mut draft: P,
    ) -> Result<Aggregate<P::Row, ChildRow<P>>, AppError> {
        let now = Utc::now();
        let submitted = draft.take_children();
        let references = references_of(&draft, &submitted);
        let plan = reconcile::plan(&[], submitted)?;
        self.check_references(references).await?;

        let parent = draft.build(RowMeta::fresh(self.company_id, self.actor_id, now), None);
        self.tx.insert(&parent).await?;

        let mut children = Vec::with_capacity(plan.insert.len());
        for item in plan.insert {
            let row = item.build(RowMeta::fresh(self.company_id, self.actor_id, now), parent.id());
            self.tx.insert(&row).await?;
            self.trail.inserted(&row);
            children.push(row);
        }

        // Pai por último: só depois de todas as filhas
        self.trail.inserted(&parent);

        Ok(Aggregate { parent, children })
    }

    pub async fn update_aggregate<P: AggregateDraft>(
        &mut self,
        id: Uuid,
        mut draft: P,
    ) -> Result<Aggregate<P::Row, ChildRow<P>>, AppError> {
        let previous = self
            .tx
            .find::<P::Row>(self.company_id, id)
            .await?
            .ok_or(AppError::NotFound(<P::Row as Record>::ENTITY))?;

        let existing: Vec<ChildRow<P>> = self.tx.children(self.company_id, id).await?;
        let existing_ids: Vec<Uuid> = existing.iter().map(|row| row.id()).collect();
        let submitted = draft.take_children();
        let references = references_of(&draft, &submitted);
        let plan = reconcile::plan(&existing_ids, submitted)?;
        self.check_references(references).await?;
        let now = Utc::now();

        for child_id in plan.delete {
            if let Some(old) = existing.iter().find(|row| row.id() == child_id) {
                self.tx.delete::<ChildRow<P>>(self.company_id, child_id).await?;
                self.trail.deleted(old);
            }
        }

        for item in plan.update {
            let Some(old) = item
                .id()
                .and_then(|child_id| existing.iter().find(|row| row.id() == child_id))
            else {
                continue;
            };
            let row = item.build(RowMeta::touched(old, self.actor_id, now), id);
            self.tx.update(&row).await?;
            self.trail.updated(old, &row);
        }

        for item in plan.insert {
            let row = item.build(RowMeta::fresh(self.company_id, self.actor_id, now), id);
            self.tx.insert(&row).await?;
            self.trail.inserted(&row);
        }

        let parent = draft.build(RowMeta::touched(&previous, self.actor_id, now), Some(&previous));
        self.tx.update(&parent).await?;
        self.trail.updated(&previous, &parent);

        let children = self.tx.children(self.company_id, id).await?;
        Ok(Aggregate { parent, children })
    }

    pub async fn delete_aggregate<P: Record, C: ChildRecord>(&mut self, id: Uuid) -> Result<(), AppError> {
        let previous = self
            .tx
            .find::<P>(self.company_id, id)
            .await?
            .ok_or(AppError::NotFound(P::ENTITY))?;

        for cascade in P::DEPENDENTS {
            let removed = self.tx.delete_dependents(*cascade, self.company_id, id).await?;
            for snapshot in removed {
                self.trail.removed(cascade.table(), snapshot);
            }
        }

        let children: Vec<C> = self.tx.children(self.company_id, id).await?;
        self.tx.delete_by::<C>(self.company_id, C::PARENT_COLUMN, id).await?;
        for child in &children {
            self.trail.deleted(child);
        }

        self.tx.delete::<P>(self.company_id, id).await?;
        self.trail.deleted(&previous);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        db::memory::{MemoryStorage, RecordingSink},
        models::{
            audit::AuditAction,
            security::{
                GroupRuleItem, RuleMenuPermission, SecurityGroup, SecurityGroupPayload,
                SecurityGroupRule, SecurityRule, SecurityRulePayload,
            },
        },
    };

    fn principal() -> Principal {
        Principal {
            id: Uuid::new_v4(),
            username: "admin".into(),
            email: None,
            phone: None,
            company_id: Uuid::new_v4(),
            is_admin: true,
        }
    }

    fn pipeline(db: &MemoryStorage, sink: &RecordingSink) -> MutationPipeline<MemoryStorage> {
        MutationPipeline::new(db.clone(), AuditLogger::new(Arc::new(sink.clone())))
    }

    fn group_payload(name: &str, rules: Vec<GroupRuleItem>) -> SecurityGroupPayload {
        SecurityGroupPayload { name: name.into(), description: String::new(), rules }
    }

    fn rule(id: Option<Uuid>, rule_id: Uuid) -> GroupRuleItem {
        GroupRuleItem { id, rule_id }
    }

    fn seed_rule(db: &MemoryStorage, who: &Principal) -> Uuid {
        db.seed("security_rules", who.company_id)
    }

    #[tokio::test]
    async fn create_then_fetch_returns_every_child() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let pipeline = pipeline(&db, &sink);
        let who = principal();
        let (r1, r2, r3) = (seed_rule(&db, &who), seed_rule(&db, &who), seed_rule(&db, &who));

        let created = pipeline
            .create(&who, group_payload("Ops", vec![rule(None, r1), rule(None, r2), rule(None, r3)]))
            .await
            .unwrap();
        let fetched = pipeline
            .fetch::<SecurityGroup, SecurityGroupRule>(&who, created.parent.id)
            .await
            .unwrap();

        assert_eq!(fetched.parent.name, "Ops");
        let rule_ids: Vec<Uuid> = fetched.children.iter().map(|c| c.rule_id).collect();
        assert_eq!(rule_ids, vec![r1, r2, r3]);
        assert!(fetched.children.iter().all(|c| c.group_id == created.parent.id));
    }

    #[tokio::test]
    async fn create_writes_one_record_per_row_parent_last() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let pipeline = pipeline(&db, &sink);
        let who = principal();
        let (r1, r2) = (seed_rule(&db, &who), seed_rule(&db, &who));

        pipeline
            .create(&who, group_payload("Ops", vec![rule(None, r1), rule(None, r2)]))
            .await
            .unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.action == AuditAction::Insert));
        assert_eq!(records[0].table_name, "security_group_rules");
        assert_eq!(records[2].table_name, "security_groups");
    }

    #[tokio::test]
    async fn update_reconciles_children() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let pipeline = pipeline(&db, &sink);
        let who = principal();
        let (r1, r2, r3) = (seed_rule(&db, &who), seed_rule(&db, &who), seed_rule(&db, &who));
        let created = pipeline
            .create(&who, group_payload("Ops", vec![rule(None, r1), rule(None, r2)]))
            .await
            .unwrap();
        let kept = created.children.iter().find(|c| c.rule_id == r2).unwrap().id;
        let before: Vec<Uuid> = created.children.iter().map(|c| c.id).collect();

        let updated = pipeline
            .update(&who, created.parent.id, group_payload("Ops 2", vec![rule(Some(kept), r2), rule(None, r3)]))
            .await
            .unwrap();

        assert_eq!(updated.parent.name, "Ops 2");
        assert_eq!(updated.children.len(), 2);
        assert!(updated.children.iter().any(|c| c.id == kept && c.rule_id == r2));
        let fresh = updated.children.iter().find(|c| c.rule_id == r3).unwrap();
        assert!(!before.contains(&fresh.id));
        assert!(updated.parent.stamps.updated_at.is_some());

        let actions: Vec<(String, AuditAction)> = sink.records()[3..]
            .iter()
            .map(|r| (r.table_name.clone(), r.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("security_group_rules".to_string(), AuditAction::Delete),
                ("security_group_rules".to_string(), AuditAction::Update),
                ("security_group_rules".to_string(), AuditAction::Insert),
                ("security_groups".to_string(), AuditAction::Update),
            ]
        );
    }

    #[tokio::test]
    async fn repeating_an_update_is_idempotent() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let pipeline = pipeline(&db, &sink);
        let who = principal();
        let r1 = seed_rule(&db, &who);
        let created = pipeline
            .create(&who, group_payload("Ops", vec![rule(None, r1)]))
            .await
            .unwrap();
        let submitted: Vec<GroupRuleItem> = created
            .children
            .iter()
            .map(|c| rule(Some(c.id), c.rule_id))
            .collect();

        let first = pipeline
            .update(&who, created.parent.id, group_payload("Ops", submitted.clone()))
            .await
            .unwrap();
        let second = pipeline
            .update(&who, created.parent.id, group_payload("Ops", submitted))
            .await
            .unwrap();

        let ids = |children: &[SecurityGroupRule]| children.iter().map(|c| c.id).collect::<Vec<_>>();
        assert_eq!(ids(&first.children), ids(&second.children));
        assert_eq!(ids(&second.children), ids(&created.children));
    }

    #[tokio::test]
    async fn update_of_unknown_parent_is_not_found() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let pipeline = pipeline(&db, &sink);

        let result = pipeline
            .update(&principal(), Uuid::new_v4(), group_payload("Ops", vec![]))
            .await;

        assert!(matches!(result, Err(AppError::NotFound("Grupo de segurança"))));
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_children_and_parent() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let pipeline = pipeline(&db, &sink);
        let who = principal();
        let r1 = seed_rule(&db, &who);
        let created = pipeline
            .create(&who, group_payload("Ops", vec![rule(None, r1)]))
            .await
            .unwrap();

        pipeline
            .delete::<SecurityGroup, SecurityGroupRule>(&who, created.parent.id)
            .await
            .unwrap();

        assert!(db.rows("security_groups").is_empty());
        assert!(db.rows("security_group_rules").is_empty());
        let deletes: Vec<&str> = sink
            .records()
            .iter()
            .filter(|r| r.action == AuditAction::Delete)
            .map(|r| if r.table_name == "security_groups" { "pai" } else { "filha" })
            .collect();
        assert_eq!(deletes, vec!["filha", "pai"]);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_writes_nothing() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let pipeline = pipeline(&db, &sink);

        let result = pipeline
            .delete::<SecurityGroup, SecurityGroupRule>(&principal(), Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn failure_rolls_back_and_skips_audit() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let who = principal();
        let r1 = seed_rule(&db, &who);
        let failing = MutationPipeline::new(
            db.failing_on("security_group_rules"),
            AuditLogger::new(Arc::new(sink.clone())),
        );

        let result = failing
            .create(&who, group_payload("Ops", vec![rule(None, r1)]))
            .await;

        assert!(matches!(result, Err(AppError::InternalServerError(_))));
        assert!(db.rows("security_groups").is_empty());
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn other_tenants_cannot_see_the_row() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let pipeline = pipeline(&db, &sink);
        let created = pipeline
            .create(&principal(), group_payload("Ops", vec![]))
            .await
            .unwrap();

        let result = pipeline
            .fetch::<SecurityGroup, SecurityGroupRule>(&principal(), created.parent.id)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn references_must_belong_to_the_same_company() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let pipeline = pipeline(&db, &sink);
        let (mine, theirs) = (principal(), principal());
        let payload = SecurityRulePayload {
            name: "Leitura".into(),
            description: String::new(),
            menu_permissions: vec![],
        };
        let their_rule = pipeline.create(&theirs, payload).await.unwrap();
        let audited = sink.records().len();

        for rule_id in [their_rule.parent.id, Uuid::new_v4()] {
            let result = pipeline
                .create(&mine, group_payload("Ops", vec![rule(None, rule_id)]))
                .await;
            assert!(matches!(result, Err(AppError::NotFound("Regra de segurança"))));
        }

        assert!(db.rows("security_groups").is_empty());
        assert!(db.rows("security_group_rules").is_empty());
        assert_eq!(sink.records().len(), audited);

        pipeline
            .delete::<SecurityRule, RuleMenuPermission>(&theirs, their_rule.parent.id)
            .await
            .unwrap();
        assert!(db.rows("security_rules").is_empty());
    }

    #[tokio::test]
    async fn update_with_a_foreign_reference_keeps_the_stored_children() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let pipeline = pipeline(&db, &sink);
        let (mine, theirs) = (principal(), principal());
        let r1 = seed_rule(&db, &mine);
        let foreign = seed_rule(&db, &theirs);
        let created = pipeline
            .create(&mine, group_payload("Ops", vec![rule(None, r1)]))
            .await
            .unwrap();

        let result = pipeline
            .update(&mine, created.parent.id, group_payload("Ops", vec![rule(None, foreign)]))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        let stored = pipeline
            .fetch::<SecurityGroup, SecurityGroupRule>(&mine, created.parent.id)
            .await
            .unwrap();
        assert_eq!(stored.children.len(), 1);
        assert_eq!(stored.children[0].rule_id, r1);
    }

    #[tokio::test]
    async fn duplicate_keys_reject_the_whole_update() {
        let (db, sink) = (MemoryStorage::new(), RecordingSink::new());
        let pipeline = pipeline(&db, &sink);
        let who = principal();
        let (r1, r2) = (seed_rule(&db, &who), seed_rule(&db, &who));
        let created = pipeline
            .create(&who, group_payload("Ops", vec![rule(None, r1), rule(None, r2)]))
            .await
            .unwrap();
        let submitted: Vec<GroupRuleItem> =
            created.children.iter().map(|c| rule(Some(c.id), r1)).collect();

        let result = pipeline
            .update(&who, created.parent.id, group_payload("Ops", submitted))
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
        let stored = pipeline
            .fetch::<SecurityGroup, SecurityGroupRule>(&who, created.parent.id)
            .await
            .unwrap();
        let ids = |children: &[SecurityGroupRule]| children.iter().map(|c| c.id).collect::<Vec<_>>();
        assert_eq!(ids(&stored.children), ids(&created.children));
    }

    #[tokio::test]
    async fn unavailable_audit_sink_does_not_undo_the_write() {
        let db = MemoryStorage::new();
        let pipeline =
            MutationPipeline::new(db.clone(), AuditLogger::new(Arc::new(RecordingSink::failing())));
        let who = principal();
        let (r1, r2) = (seed_rule(&db, &who), seed_rule(&db, &who));

        let created = pipeline
            .create(&who, group_payload("Ops", vec![rule(None, r1)]))
            .await
            .unwrap();
        let updated = pipeline
            .update(&who, created.parent.id, group_payload("Ops 2", vec![rule(None, r2)]))
            .await
            .unwrap();

        assert_eq!(updated.parent.name, "Ops 2");
        let stored = pipeline
            .fetch::<SecurityGroup, SecurityGroupRule>(&who, created.parent.id)
            .await
            .unwrap();
        assert_eq!(stored.parent.name, "Ops 2");
        assert_eq!(stored.children.len(), 1);
        assert_eq!(stored.children[0].rule_id, r2);
    }
}
