// src/models/user.rs

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
    models::security::SecurityGroup,
    services::reconcile::Reconcilable,
};

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub company_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub user_type: i32,

    // Nunca sai na API nem nos snapshots de auditoria
    #[serde(skip_serializing, default)]
    #[schema(ignore)]
    pub password_hash: String,

    #[serde(flatten)]
    #[sqlx(flatten)]
    pub stamps: Stamps,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const ENTITY: &'static str = "Usuário";
    const COLUMNS: &'static [&'static str] = &[
        "username",
        "full_name",
        "email",
        "phone",
        "address",
        "is_active",
        "is_admin",
        "user_type",
    ];
    const INSERT_ONLY: &'static [&'static str] = &["password_hash"];
    const ORDER_BY: &'static str = "username, id";
    const DEPENDENTS: &'static [Cascade] = &[Cascade::Direct {
        table: "task_users",
        column: "user_id",
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
        query
            .bind(self.username.clone())
            .bind(self.full_name.clone())
            .bind(self.email.clone())
            .bind(self.phone.clone())
            .bind(self.address.clone())
            .bind(self.is_active)
            .bind(self.is_admin)
            .bind(self.user_type)
    }

    fn bind_insert_only<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query.bind(self.password_hash.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserGroup {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub stamps: Stamps,
}

impl Record for UserGroup {
    const TABLE: &'static str = "user_groups";
    const ENTITY: &'static str = "Grupo do usuário";
    const COLUMNS: &'static [&'static str] = &["user_id", "group_id"];

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
        query.bind(self.user_id).bind(self.group_id)
    }
}

impl ChildRecord for UserGroup {
    const PARENT_COLUMN: &'static str = "user_id";

    fn parent_id(&self) -> Uuid {
        self.user_id
    }
}

/// Corpo de `POST /user` e `PUT /user/{id}`. A senha só é lida na criação.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UserPayload {
    #[validate(length(min = 3, max = 60, message = "O usuário deve ter entre 3 e 60 caracteres."))]
    pub username: String,
    #[validate(length(min = 1, message = "O nome completo é obrigatório."))]
    pub full_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub user_type: i32,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
    #[serde(default, rename = "groupList")]
    #[validate(nested)]
    pub groups: Vec<UserGroupItem>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UserGroupItem {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub group_id: Uuid,
}

/// Usuário novo com a senha já transformada em hash.
pub struct NewUser {
    pub payload: UserPayload,
    pub password_hash: String,
}

impl UserPayload {
    fn into_user(self, meta: RowMeta, password_hash: String) -> User {
        User {
            id: meta.id,
            company_id: meta.company_id,
            username: self.username,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            is_active: self.is_active,
            is_admin: self.is_admin,
            user_type: self.user_type,
            password_hash,
            stamps: meta.stamps,
        }
    }
}

impl AggregateDraft for NewUser {
    type Row = User;
    type Child = UserGroupItem;

    fn take_children(&mut self) -> Vec<UserGroupItem> {
        std::mem::take(&mut self.payload.groups)
    }

    fn build(self, meta: RowMeta, _previous: Option<&User>) -> User {
        self.payload.into_user(meta, self.password_hash)
    }
}

/// Atualização de usuário. Sem `may_grant_admin`, o `is_admin` gravado prevalece.
pub struct UserChange {
    pub payload: UserPayload,
    pub may_grant_admin: bool,
}

impl AggregateDraft for UserChange {
    type Row = User;
    type Child = UserGroupItem;

    fn take_children(&mut self) -> Vec<UserGroupItem> {
        std::mem::take(&mut self.payload.groups)
    }

    fn build(self, meta: RowMeta, previous: Option<&User>) -> User {
        let password_hash = previous.map(|user| user.password_hash.clone()).unwrap_or_default();
        let stored_admin = previous.is_some_and(|user| user.is_admin);

        let mut user = self.payload.into_user(meta, password_hash);
        if !self.may_grant_admin {
            user.is_admin = stored_admin;
        }
        user
    }
}

impl Reconcilable for UserGroupItem {
    const FIELD: &'static str = "groupList";

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn natural_key(&self) -> Option<String> {
        Some(self.group_id.to_string())
    }
}

impl ChildDraft for UserGroupItem {
    type Row = UserGroup;

    fn references(&self) -> Vec<Reference> {
        vec![Reference::to::<SecurityGroup>(self.group_id)]
    }

    fn build(self, meta: RowMeta, parent_id: Uuid) -> UserGroup {
        UserGroup {
            id: meta.id,
            company_id: meta.company_id,
            user_id: parent_id,
            group_id: self.group_id,
            stamps: meta.stamps,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "groupList")]
    pub groups: Vec<UserGroup>,
}

impl From<Aggregate<User, UserGroup>> for UserDetail {
    fn from(aggregate: Aggregate<User, UserGroup>) -> Self {
        Self { user: aggregate.parent, groups: aggregate.children }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn password_hash_never_serializes() {
        let payload: UserPayload = serde_json::from_value(serde_json::json!({
            "username": "ana",
            "full_name": "Ana Souza",
            "password": "segredo1"
        }))
        .unwrap();
        let meta = RowMeta::fresh(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
        let user = NewUser { payload, password_hash: "$2b$04$hash".into() }.build(meta, None);

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["username"], "ana");
        assert!(value.get("password_hash").is_none());
        assert!(value.get("password").is_none());
    }

    #[test]
    fn update_keeps_the_stored_hash() {
        let meta = RowMeta::fresh(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
        let payload = |name: &str| -> UserPayload {
            serde_json::from_value(serde_json::json!({ "username": name, "full_name": "Ana" })).unwrap()
        };
        let stored = NewUser { payload: payload("ana"), password_hash: "hash-antigo".into() }
            .build(meta.clone(), None);

        let change = UserChange { payload: payload("ana.souza"), may_grant_admin: true };
        let updated = change.build(meta, Some(&stored));

        assert_eq!(updated.username, "ana.souza");
        assert_eq!(updated.password_hash, "hash-antigo");
    }

    #[test]
    fn admin_flag_is_kept_unless_granting_is_allowed() {
        let meta = RowMeta::fresh(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
        let payload = |is_admin: bool| -> UserPayload {
            serde_json::from_value(serde_json::json!({
                "username": "ana",
                "full_name": "Ana",
                "is_admin": is_admin
            }))
            .unwrap()
        };
        let stored = NewUser { payload: payload(false), password_hash: "hash".into() }
            .build(meta.clone(), None);

        let locked = UserChange { payload: payload(true), may_grant_admin: false };
        assert!(!locked.build(meta.clone(), Some(&stored)).is_admin);

        let granted = UserChange { payload: payload(true), may_grant_admin: true };
        assert!(granted.build(meta, Some(&stored)).is_admin);
    }
}
