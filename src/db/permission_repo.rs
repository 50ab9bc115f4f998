// src/db/permission_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::menu::{Menu, MenuGrant},
};

#[derive(Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_menus(&self) -> Result<Vec<Menu>, AppError> {
        let menus = sqlx::query_as::<_, Menu>(
            r#"
            SELECT id, title, url, icon, parent_id, sequence_no, is_active
            FROM menus
            ORDER BY sequence_no, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(menus)
    }

    pub async fn find_menu(&self, id: i32) -> Result<Option<Menu>, AppError> {
        let menu = sqlx::query_as::<_, Menu>(
            r#"
            SELECT id, title, url, icon, parent_id, sequence_no, is_active
            FROM menus
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(menu)
    }

    /// Uma linha por concessão alcançável:
    /// usuário -> grupos -> regras -> permissões de menu.
    /// Menus repetidos são unidos em `PermissionService`.
    pub async fn grants_for(&self, user_id: Uuid, company_id: Uuid) -> Result<Vec<MenuGrant>, AppError> {
        let grants = sqlx::query_as::<_, MenuGrant>(
            r#"
            SELECT
                m.id, m.title, m.url, m.icon, m.parent_id, m.sequence_no, m.is_active,
                p.can_view, p.can_create, p.can_update, p.can_delete, p.can_report
            FROM user_groups ug
            JOIN security_groups g
                ON g.id = ug.group_id AND g.company_id = ug.company_id
            JOIN security_group_rules gr
                ON gr.group_id = g.id AND gr.company_id = g.company_id
            JOIN security_rules r
                ON r.id = gr.rule_id AND r.company_id = g.company_id
            JOIN rule_menu_permissions p
                ON p.rule_id = r.id AND p.company_id = r.company_id
            JOIN menus m
                ON m.id = p.menu_id
            WHERE ug.user_id = $1 AND ug.company_id = $2
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(grants)
    }
}
