// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::user::User};

// Consultas de usuário fora do pipeline: login e criação do administrador inicial
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // O username é único entre todas as empresas
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn create_company<'e, E>(&self, executor: E, name: &str) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO companies (id, name) VALUES ($1, $2)")
            .bind(id)
            .bind(name)
            .execute(executor)
            .await?;
        Ok(id)
    }

    pub async fn create_admin<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        username: &str,
        password_hash: &str,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (id, company_id, username, full_name, is_active, is_admin, password_hash)
            VALUES ($1, $2, $3, $3, TRUE, TRUE, $4)
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(username)
        .bind(password_hash)
        .execute(executor)
        .await
        .map_err(AppError::from_db)?;
        Ok(id)
    }
}
