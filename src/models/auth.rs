// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{menu::MenuGrant, user::User};

/// Usuário autenticado da requisição, decodificado do token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Uuid,
    pub is_admin: bool,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            company_id: user.company_id,
            is_admin: user.is_admin,
        }
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Uuid,
    pub is_admin: bool,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn new(principal: &Principal, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: principal.id,
            username: principal.username.clone(),
            email: principal.email.clone(),
            phone: principal.phone.clone(),
            company_id: principal.company_id,
            is_admin: principal.is_admin,
            exp: expires_at.timestamp().max(0) as usize,
            iat: issued_at.timestamp().max(0) as usize,
        }
    }

    pub fn into_principal(self) -> Principal {
        Principal {
            id: self.sub,
            username: self.username,
            email: self.email,
            phone: self.phone,
            company_id: self.company_id,
            is_admin: self.is_admin,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "O usuário é obrigatório."))]
    pub username: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: Principal,
    pub token: String,
    pub menus: Vec<MenuGrant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: Principal,
    pub menus: Vec<MenuGrant>,
}
