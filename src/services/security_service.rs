// src/services/security_service.rs

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::store::{PgStorage, Storage},
    models::{
        auth::Principal,
        security::{
            RuleMenuPermission, SecurityGroup, SecurityGroupDetail, SecurityGroupPayload,
            SecurityGroupRule, SecurityRule, SecurityRuleDetail, SecurityRulePayload,
        },
    },
    services::pipeline::MutationPipeline,
};

/// Regras (menus x bits) e grupos (conjuntos de regras).
#[derive(Clone)]
pub struct SecurityService<D: Storage = PgStorage> {
    pipeline: MutationPipeline<D>,
}

impl<D: Storage> SecurityService<D> {
    pub fn new(pipeline: MutationPipeline<D>) -> Self {
        Self { pipeline }
    }

    // --- Regras ---

    pub async fn list_rules(&self, principal: &Principal) -> Result<Vec<SecurityRule>, AppError> {
        self.pipeline.list(principal).await
    }

    pub async fn paginate_rules(
        &self,
        principal: &Principal,
        request: PageRequest,
    ) -> Result<Page<SecurityRule>, AppError> {
        self.pipeline.paginate(principal, request).await
    }

    pub async fn fetch_rule(&self, principal: &Principal, id: Uuid) -> Result<SecurityRuleDetail, AppError> {
        let aggregate = self
            .pipeline
            .fetch::<SecurityRule, RuleMenuPermission>(principal, id)
            .await?;
        Ok(aggregate.into())
    }

    pub async fn create_rule(
        &self,
        principal: &Principal,
        payload: SecurityRulePayload,
    ) -> Result<SecurityRuleDetail, AppError> {
        let aggregate = self.pipeline.create(principal, payload).await?;
        tracing::info!(rule_id = %aggregate.parent.id, "🛡️ Regra de segurança criada");
        Ok(aggregate.into())
    }

    pub async fn update_rule(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: SecurityRulePayload,
    ) -> Result<SecurityRuleDetail, AppError> {
        let aggregate = self.pipeline.update(principal, id, payload).await?;
        Ok(aggregate.into())
    }

    pub async fn delete_rule(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        self.pipeline
            .delete::<SecurityRule, RuleMenuPermission>(principal, id)
            .await?;
        tracing::info!(rule_id = %id, "Regra de segurança removida");
        Ok(())
    }

    // --- Grupos ---

    pub async fn list_groups(&self, principal: &Principal) -> Result<Vec<SecurityGroup>, AppError> {
        self.pipeline.list(principal).await
    }

    pub async fn paginate_groups(
        &self,
        principal: &Principal,
        request: PageRequest,
    ) -> Result<Page<SecurityGroup>, AppError> {
        self.pipeline.paginate(principal, request).await
    }

    pub async fn fetch_group(&self, principal: &Principal, id: Uuid) -> Result<SecurityGroupDetail, AppError> {
        let aggregate = self
            .pipeline
            .fetch::<SecurityGroup, SecurityGroupRule>(principal, id)
            .await?;
        Ok(aggregate.into())
    }

    pub async fn create_group(
        &self,
        principal: &Principal,
        payload: SecurityGroupPayload,
    ) -> Result<SecurityGroupDetail, AppError> {
        let aggregate = self.pipeline.create(principal, payload).await?;
        tracing::info!(group_id = %aggregate.parent.id, "🛡️ Grupo de segurança criado");
        Ok(aggregate.into())
    }

    pub async fn update_group(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: SecurityGroupPayload,
    ) -> Result<SecurityGroupDetail, AppError> {
        let aggregate = self.pipeline.update(principal, id, payload).await?;
        Ok(aggregate.into())
    }

    pub async fn delete_group(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        self.pipeline
            .delete::<SecurityGroup, SecurityGroupRule>(principal, id)
            .await?;
        tracing::info!(group_id = %id, "Grupo de segurança removido");
        Ok(())
    }
}
