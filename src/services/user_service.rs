// src/services/user_service.rs

use bcrypt::hash;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::store::{PgStorage, Storage},
    models::{
        auth::Principal,
        user::{NewUser, User, UserChange, UserDetail, UserGroup, UserPayload},
    },
    services::pipeline::MutationPipeline,
};

#[derive(Clone)]
pub struct UserService<D: Storage = PgStorage> {
    pipeline: MutationPipeline<D>,
    hash_cost: u32,
}

impl<D: Storage> UserService<D> {
    pub fn new(pipeline: MutationPipeline<D>, hash_cost: u32) -> Self {
        Self { pipeline, hash_cost }
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<User>, AppError> {
        self.pipeline.list(principal).await
    }

    pub async fn paginate(&self, principal: &Principal, request: PageRequest) -> Result<Page<User>, AppError> {
        self.pipeline.paginate(principal, request).await
    }

    pub async fn fetch(&self, principal: &Principal, id: Uuid) -> Result<UserDetail, AppError> {
        let aggregate = self.pipeline.fetch::<User, UserGroup>(principal, id).await?;
        Ok(aggregate.into())
    }

    pub async fn create(&self, principal: &Principal, mut payload: UserPayload) -> Result<UserDetail, AppError> {
        if payload.is_admin && !principal.is_admin {
            return Err(AppError::Forbidden(
                "Somente administradores podem criar outros administradores.".to_string(),
            ));
        }

        let Some(password) = payload.password.take() else {
            let mut errors = ValidationErrors::new();
            errors.add(
                "password",
                ValidationError::new("required").with_message("A senha é obrigatória.".into()),
            );
            return Err(AppError::ValidationError(errors));
        };

        // 1. Hashing fora da transação, em um thread separado
        let cost = self.hash_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let aggregate = self
            .pipeline
            .create(principal, NewUser { payload, password_hash })
            .await?;

        tracing::info!(user_id = %aggregate.parent.id, "👤 Usuário criado");
        Ok(aggregate.into())
    }

    /// A senha gravada nunca é alterada por aqui; `is_admin` só muda por um administrador.
    pub async fn update(&self, principal: &Principal, id: Uuid, payload: UserPayload) -> Result<UserDetail, AppError> {
        let change = UserChange { payload, may_grant_admin: principal.is_admin };
        let aggregate = self.pipeline.update(principal, id, change).await?;
        Ok(aggregate.into())
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        self.pipeline.delete::<User, UserGroup>(principal, id).await?;
        tracing::info!(user_id = %id, "Usuário removido");
        Ok(())
    }
}
