// src/models/menu.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Item de navegação global (dados de referência semeados pela migração).
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Menu {
    pub id: i32,
    pub title: String,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<i32>,
    pub sequence_no: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    View,
    Create,
    Update,
    Delete,
    Report,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::View => "visualizar",
            Capability::Create => "criar",
            Capability::Update => "alterar",
            Capability::Delete => "excluir",
            Capability::Report => "relatório",
        }
    }
}

/// Os cinco bits de permissão de um menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(default)]
pub struct Capabilities {
    pub can_view: bool,
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_report: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        can_view: true,
        can_create: true,
        can_update: true,
        can_delete: true,
        can_report: true,
    };

    pub fn union(self, other: Capabilities) -> Capabilities {
        Capabilities {
            can_view: self.can_view || other.can_view,
            can_create: self.can_create || other.can_create,
            can_update: self.can_update || other.can_update,
            can_delete: self.can_delete || other.can_delete,
            can_report: self.can_report || other.can_report,
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::View => self.can_view,
            Capability::Create => self.can_create,
            Capability::Update => self.can_update,
            Capability::Delete => self.can_delete,
            Capability::Report => self.can_report,
        }
    }
}

/// Menu com as permissões efetivas do usuário.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct MenuGrant {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub menu: Menu,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub capabilities: Capabilities,
}
