// src/models/security.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::record::{
        Aggregate, AggregateDraft, Cascade, ChildDraft, ChildRecord, PgQuery, Record, Reference,
        RowMeta, Stamps,
    },
    models::menu::Capabilities,
    services::reconcile::Reconcilable,
};

// --- Regras de segurança ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SecurityRule {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub stamps: Stamps,
}

impl Record for SecurityRule {
    const TABLE: &'static str = "security_rules";
    const ENTITY: &'static str = "Regra de segurança";
    const COLUMNS: &'static [&'static str] = &["name", "description"];
    const ORDER_BY: &'static str = "name, id";
    const DEPENDENTS: &'static [Cascade] = &[Cascade::Direct {
        table: "security_group_rules",
        column: "rule_id",
    }];

    fn id(&self) -> Uuid {
        self.id
    }

    fn company_id(&self) -> Uuid {
        self.company_id
    }

    fn stamps(&self) -> &Stamps {
        &self.stamps
    }

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query.bind(self.name.clone()).bind(self.description.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RuleMenuPermission {
    pub id: Uuid,
    pub company_id: Uuid,
    pub rule_id: Uuid,
    pub menu_id: i32,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub capabilities: Capabilities,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub stamps: Stamps,
}

impl Record for RuleMenuPermission {
    const TABLE: &'static str = "rule_menu_permissions";
    const ENTITY: &'static str = "Permissão de menu";
    const COLUMNS: &'static [&'static str] = &[
        "rule_id",
        "menu_id",
        "can_view",
        "can_create",
        "can_update",
        "can_delete",
        "can_report",
    ];
    const ORDER_BY: &'static str = "menu_id, id";

    fn id(&self) -> Uuid {
        self.id
    }

    fn company_id(&self) -> Uuid {
        self.company_id
    }

    fn stamps(&self) -> &Stamps {
        &self.stamps
    }

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        let caps = self.capabilities;
        query
            .bind(self.rule_id)
            .bind(self.menu_id)
            .bind(caps.can_view)
            .bind(caps.can_create)
            .bind(caps.can_update)
            .bind(caps.can_delete)
            .bind(caps.can_report)
    }
}

impl ChildRecord for RuleMenuPermission {
    const PARENT_COLUMN: &'static str = "rule_id";

    fn parent_id(&self) -> Uuid {
        self.rule_id
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SecurityRulePayload {
    #[validate(length(min = 1, max = 120, message = "O nome deve ter entre 1 e 120 caracteres."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "menuPermissionList")]
    #[validate(nested)]
    pub menu_permissions: Vec<RuleMenuPermissionItem>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RuleMenuPermissionItem {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(range(min = 1, message = "Menu inválido."))]
    pub menu_id: i32,
    #[serde(flatten)]
    pub capabilities: Capabilities,
}

impl AggregateDraft for SecurityRulePayload {
    type Row = SecurityRule;
    type Child = RuleMenuPermissionItem;

    fn take_children(&mut self) -> Vec<RuleMenuPermissionItem> {
        std::mem::take(&mut self.menu_permissions)
    }

    fn build(self, meta: RowMeta, _previous: Option<&SecurityRule>) -> SecurityRule {
        SecurityRule {
            id: meta.id,
            company_id: meta.company_id,
            name: self.name,
            description: self.description,
            stamps: meta.stamps,
        }
    }
}

impl Reconcilable for RuleMenuPermissionItem {
    const FIELD: &'static str = "menuPermissionList";

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn natural_key(&self) -> Option<String> {
        Some(self.menu_id.to_string())
    }
}

impl ChildDraft for RuleMenuPermissionItem {
    type Row = RuleMenuPermission;

    fn build(self, meta: RowMeta, parent_id: Uuid) -> RuleMenuPermission {
        RuleMenuPermission {
            id: meta.id,
            company_id: meta.company_id,
            rule_id: parent_id,
            menu_id: self.menu_id,
            capabilities: self.capabilities,
            stamps: meta.stamps,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SecurityRuleDetail {
    #[serde(flatten)]
    pub rule: SecurityRule,
    #[serde(rename = "menuPermissionList")]
    pub menu_permissions: Vec<RuleMenuPermission>,
}

impl From<Aggregate<SecurityRule, RuleMenuPermission>> for SecurityRuleDetail {
    fn from(aggregate: Aggregate<SecurityRule, RuleMenuPermission>) -> Self {
        Self { rule: aggregate.parent, menu_permissions: aggregate.children }
    }
}

// --- Grupos de segurança ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SecurityGroup {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub stamps: Stamps,
}

impl Record for SecurityGroup {
    const TABLE: &'static str = "security_groups";
    const ENTITY: &'static str = "Grupo de segurança";
    const COLUMNS: &'static [&'static str] = &["name", "description"];
    const ORDER_BY: &'static str = "name, id";
    const DEPENDENTS: &'static [Cascade] = &[Cascade::Direct {
        table: "user_groups",
        column: "group_id",
    }];

    fn id(&self) -> Uuid {
        self.id
    }

    fn company_id(&self) -> Uuid {
        self.company_id
    }

    fn stamps(&self) -> &Stamps {
        &self.stamps
    }

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query.bind(self.name.clone()).bind(self.description.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SecurityGroupRule {
    pub id: Uuid,
    pub company_id: Uuid,
    pub group_id: Uuid,
    pub rule_id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub stamps: Stamps,
}

impl Record for SecurityGroupRule {
    const TABLE: &'static str = "security_group_rules";
    const ENTITY: &'static str = "Regra do grupo";
    const COLUMNS: &'static [&'static str] = &["group_id", "rule_id"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn company_id(&self) -> Uuid {
        self.company_id
    }

    fn stamps(&self) -> &Stamps {
        &self.stamps
    }

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query.bind(self.group_id).bind(self.rule_id)
    }
}

impl ChildRecord for SecurityGroupRule {
    const PARENT_COLUMN: &'static str = "group_id";

    fn parent_id(&self) -> Uuid {
        self.group_id
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SecurityGroupPayload {
    #[validate(length(min = 1, max = 120, message = "O nome deve ter entre 1 e 120 caracteres."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "ruleList")]
    #[validate(nested)]
    pub rules: Vec<GroupRuleItem>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GroupRuleItem {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub rule_id: Uuid,
}

impl AggregateDraft for SecurityGroupPayload {
    type Row = SecurityGroup;
    type Child = GroupRuleItem;

    fn take_children(&mut self) -> Vec<GroupRuleItem> {
        std::mem::take(&mut self.rules)
    }

    fn build(self, meta: RowMeta, _previous: Option<&SecurityGroup>) -> SecurityGroup {
        SecurityGroup {
            id: meta.id,
            company_id: meta.company_id,
            name: self.name,
            description: self.description,
            stamps: meta.stamps,
        }
    }
}

impl Reconcilable for GroupRuleItem {
    const FIELD: &'static str = "ruleList";

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn natural_key(&self) -> Option<String> {
        Some(self.rule_id.to_string())
    }
}

impl ChildDraft for GroupRuleItem {
    type Row = SecurityGroupRule;

    fn references(&self) -> Vec<Reference> {
        vec![Reference::to::<SecurityRule>(self.rule_id)]
    }

    fn build(self, meta: RowMeta, parent_id: Uuid) -> SecurityGroupRule {
        SecurityGroupRule {
            id: meta.id,
            company_id: meta.company_id,
            group_id: parent_id,
            rule_id: self.rule_id,
            stamps: meta.stamps,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SecurityGroupDetail {
    #[serde(flatten)]
    pub group: SecurityGroup,
    #[serde(rename = "ruleList")]
    pub rules: Vec<SecurityGroupRule>,
}

impl From<Aggregate<SecurityGroup, SecurityGroupRule>> for SecurityGroupDetail {
    fn from(aggregate: Aggregate<SecurityGroup, SecurityGroupRule>) -> Self {
        Self { group: aggregate.parent, rules: aggregate.children }
    }
}
