// src/router.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::auth_gate,
};

pub fn build_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (verifyLogin é público via PUBLIC_PATHS)
    let auth_routes = Router::new()
        .route("/verifyLogin", post(handlers::auth::verify_login))
        .route("/verifyToken", get(handlers::auth::verify_token));

    let menu_routes = Router::new()
        .route("/", get(handlers::menu::list_menus))
        .route("/{id}", get(handlers::menu::get_menu));

    let rule_routes = Router::new()
        .route(
            "/",
            get(handlers::security_rule::list_rules).post(handlers::security_rule::create_rule),
        )
        .route("/pagination", post(handlers::security_rule::paginate_rules))
        .route(
            "/{id}",
            get(handlers::security_rule::get_rule)
                .put(handlers::security_rule::update_rule)
                .delete(handlers::security_rule::delete_rule),
        );

    let group_routes = Router::new()
        .route(
            "/",
            get(handlers::security_group::list_groups).post(handlers::security_group::create_group),
        )
        .route("/pagination", post(handlers::security_group::paginate_groups))
        .route(
            "/{id}",
            get(handlers::security_group::get_group)
                .put(handlers::security_group::update_group)
                .delete(handlers::security_group::delete_group),
        );

    let user_routes = Router::new()
        .route("/", get(handlers::user::list_users).post(handlers::user::create_user))
        .route("/pagination", post(handlers::user::paginate_users))
        .route(
            "/{id}",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        );

    let task_routes = Router::new()
        .route(
            "/board",
            get(handlers::task::list_boards).post(handlers::task::create_board),
        )
        .route("/board/pagination", post(handlers::task::paginate_boards))
        .route(
            "/board/{id}",
            get(handlers::task::get_board)
                .put(handlers::task::update_board)
                .delete(handlers::task::delete_board),
        )
        .route("/board/{id}/tasks", get(handlers::task::list_board_tasks))
        .route(
            "/task",
            get(handlers::task::list_tasks).post(handlers::task::create_task),
        )
        .route(
            "/task/{id}",
            get(handlers::task::get_task)
                .put(handlers::task::update_task)
                .delete(handlers::task::delete_task),
        );

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/audit-log", get(handlers::audit::list_audit_log))
        .nest("/auth", auth_routes)
        .nest("/menu", menu_routes)
        .nest("/security-rule", rule_routes)
        .nest("/security-group", group_routes)
        .nest("/user", user_routes)
        .nest("/task-management", task_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::not_found)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_gate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
        Router,
    };
    use serde_json::Value;
    use sqlx::{postgres::PgPoolOptions, PgPool};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::Settings,
        middleware::{
            auth::AuthenticatedUser,
            rbac::{RequireCapability, UserDelete},
        },
        models::auth::Principal,
        services::auth::TokenCodec,
    };

    const SECRET: &str = "segredo-de-teste";

    // Pool preguiçoso: qualquer acesso ao banco abriria uma conexão e apareceria em `size()`
    fn state() -> (AppState, PgPool) {
        let settings = Settings::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://ninguem@127.0.0.1:1/inexistente".to_string()),
            "JWT_SECRET" => Some(SECRET.to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy(&settings.database_url)
            .unwrap();
        (AppState::from_pool(pool.clone(), settings).unwrap(), pool)
    }

    fn principal(is_admin: bool) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            username: "maria".into(),
            email: None,
            phone: None,
            company_id: Uuid::new_v4(),
            is_admin,
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn guarded(
        AuthenticatedUser(user): AuthenticatedUser,
        _guard: RequireCapability<UserDelete>,
    ) -> String {
        user.username
    }

    fn guarded_router(app_state: AppState) -> Router {
        Router::new()
            .route("/guarded", get(guarded))
            .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_gate))
            .with_state(app_state)
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app_state, pool) = state();

        let response = build_router(app_state)
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["status"], "OK");
        assert_eq!(pool.size(), 0);
    }

    #[tokio::test]
    async fn protected_route_without_token_is_rejected_before_the_database() {
        let (app_state, pool) = state();

        let response = build_router(app_state)
            .oneshot(
                Request::post("/user")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"joao"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["status"], "UNAUTHORIZED");
        assert_eq!(pool.size(), 0);
    }

    #[tokio::test]
    async fn malformed_and_expired_tokens_are_rejected() {
        let (app_state, pool) = state();
        let expired = TokenCodec::new(SECRET, chrono::Duration::hours(-2))
            .issue(&principal(true))
            .unwrap();

        for authorization in [
            "Basic bWFyaWE6c2VuaGE=".to_string(),
            "Bearer nao-e-um-jwt".to_string(),
            format!("Bearer {expired}"),
        ] {
            let response = build_router(app_state.clone())
                .oneshot(
                    Request::get("/security-rule")
                        .header(header::AUTHORIZATION, authorization)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        assert_eq!(pool.size(), 0);
    }

    #[tokio::test]
    async fn expired_token_message_is_explicit() {
        let (app_state, _pool) = state();
        let expired = TokenCodec::new(SECRET, chrono::Duration::hours(-2))
            .issue(&principal(false))
            .unwrap();

        let response = build_router(app_state)
            .oneshot(
                Request::get("/auth/verifyToken")
                    .header(header::AUTHORIZATION, format!("Bearer {expired}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "Token expirado");
    }

    #[tokio::test]
    async fn admin_token_reaches_the_handler_without_permission_lookup() {
        let (app_state, pool) = state();
        let token = app_state.auth_service.tokens().issue(&principal(true)).unwrap();

        let response = guarded_router(app_state)
            .oneshot(
                Request::get("/guarded")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"maria");
        assert_eq!(pool.size(), 0);
    }

    #[tokio::test]
    async fn unknown_route_answers_in_the_envelope() {
        let (app_state, _pool) = state();
        let token = app_state.auth_service.tokens().issue(&principal(true)).unwrap();

        let response = build_router(app_state)
            .oneshot(
                Request::get("/nao-existe")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "Recurso não encontrado(a)");
    }

    #[tokio::test]
    async fn openapi_document_is_public() {
        let (app_state, _pool) = state();

        let response = build_router(app_state)
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["paths"]["/security-rule/{id}"].is_object());
        assert!(body["components"]["securitySchemes"]["api_jwt"].is_object());
    }
}
