// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::pagination::PageRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "audit_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Insert,
    Update,
    Delete,
}

/// Registro imutável de uma alteração de linha.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ChangeRecord {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub table_name: String,
    pub record_id: Uuid,
    pub action: AuditAction,
    #[schema(value_type = Object)]
    pub previous_data: Value,
    #[schema(value_type = Object)]
    pub new_data: Value,
    pub created_at: DateTime<Utc>,
}

/// Filtros de `GET /audit-log`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AuditLogQuery {
    /// Nome da tabela (ex.: `security_groups`)
    pub table: Option<String>,
    pub record_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl AuditLogQuery {
    pub fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.page_size.unwrap_or(defaults.page_size),
        )
    }
}
