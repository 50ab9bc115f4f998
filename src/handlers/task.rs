// src/handlers/task.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        extract::ValidatedJson,
        pagination::{Page, PageRequest},
        response::ApiResponse,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{
            BoardCreate, BoardDelete, BoardUpdate, BoardView, RequireCapability, TaskCreate,
            TaskDelete, TaskUpdate, TaskView,
        },
    },
    models::task::{Task, TaskBoard, TaskBoardDetail, TaskBoardPayload, TaskDetail, TaskPayload},
};

// ---
// Quadros
// ---

#[utoipa::path(
    get,
    path = "/task-management/board",
    tag = "Task Management",
    responses((status = 200, description = "Quadros da empresa", body = Vec<TaskBoard>)),
    security(("api_jwt" = []))
)]
pub async fn list_boards(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<BoardView>,
) -> Result<ApiResponse<Vec<TaskBoard>>, AppError> {
    let boards = app_state.task_service.list_boards(&user).await?;
    Ok(ApiResponse::ok("Quadros listados com sucesso.", boards))
}

#[utoipa::path(
    post,
    path = "/task-management/board/pagination",
    tag = "Task Management",
    request_body = PageRequest,
    responses((status = 200, description = "Página de quadros", body = Page<TaskBoard>)),
    security(("api_jwt" = []))
)]
pub async fn paginate_boards(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<BoardView>,
    ValidatedJson(request): ValidatedJson<PageRequest>,
) -> Result<ApiResponse<Page<TaskBoard>>, AppError> {
    let page = app_state.task_service.paginate_boards(&user, request).await?;
    Ok(ApiResponse::ok("Quadros listados com sucesso.", page))
}

#[utoipa::path(
    get,
    path = "/task-management/board/{id}",
    tag = "Task Management",
    params(("id" = Uuid, Path, description = "ID do quadro")),
    responses(
        (status = 200, description = "Quadro com suas colunas", body = TaskBoardDetail),
        (status = 404, description = "Quadro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_board(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<BoardView>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<TaskBoardDetail>, AppError> {
    let board = app_state.task_service.fetch_board(&user, id).await?;
    Ok(ApiResponse::ok("Quadro encontrado.", board))
}

#[utoipa::path(
    get,
    path = "/task-management/board/{id}/tasks",
    tag = "Task Management",
    params(("id" = Uuid, Path, description = "ID do quadro")),
    responses(
        (status = 200, description = "Tarefas do quadro", body = Vec<Task>),
        (status = 404, description = "Quadro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_board_tasks(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<TaskView>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Vec<Task>>, AppError> {
    let tasks = app_state.task_service.tasks_by_board(&user, id).await?;
    Ok(ApiResponse::ok("Tarefas listadas com sucesso.", tasks))
}

#[utoipa::path(
    post,
    path = "/task-management/board",
    tag = "Task Management",
    request_body = TaskBoardPayload,
    responses(
        (status = 201, description = "Quadro criado", body = TaskBoardDetail),
        (status = 400, description = "Payload inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_board(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<BoardCreate>,
    ValidatedJson(payload): ValidatedJson<TaskBoardPayload>,
) -> Result<ApiResponse<TaskBoardDetail>, AppError> {
    let board = app_state.task_service.create_board(&user, payload).await?;
    Ok(ApiResponse::created("Quadro criado com sucesso.", board))
}

#[utoipa::path(
    put,
    path = "/task-management/board/{id}",
    tag = "Task Management",
    params(("id" = Uuid, Path, description = "ID do quadro")),
    request_body = TaskBoardPayload,
    responses(
        (status = 200, description = "Quadro atualizado", body = TaskBoardDetail),
        (status = 404, description = "Quadro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_board(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<BoardUpdate>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<TaskBoardPayload>,
) -> Result<ApiResponse<TaskBoardDetail>, AppError> {
    let board = app_state.task_service.update_board(&user, id, payload).await?;
    Ok(ApiResponse::ok("Quadro atualizado com sucesso.", board))
}

#[utoipa::path(
    delete,
    path = "/task-management/board/{id}",
    tag = "Task Management",
    params(("id" = Uuid, Path, description = "ID do quadro")),
    responses(
        (status = 200, description = "Quadro e suas tarefas removidos"),
        (status = 404, description = "Quadro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_board(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<BoardDelete>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    app_state.task_service.delete_board(&user, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Quadro removido com sucesso."))
}

// ---
// Tarefas
// ---

#[utoipa::path(
    get,
    path = "/task-management/task",
    tag = "Task Management",
    responses((status = 200, description = "Tarefas da empresa", body = Vec<Task>)),
    security(("api_jwt" = []))
)]
pub async fn list_tasks(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<TaskView>,
) -> Result<ApiResponse<Vec<Task>>, AppError> {
    let tasks = app_state.task_service.list_tasks(&user).await?;
    Ok(ApiResponse::ok("Tarefas listadas com sucesso.", tasks))
}

#[utoipa::path(
    get,
    path = "/task-management/task/{id}",
    tag = "Task Management",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa com seus responsáveis", body = TaskDetail),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_task(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<TaskView>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<TaskDetail>, AppError> {
    let task = app_state.task_service.fetch_task(&user, id).await?;
    Ok(ApiResponse::ok("Tarefa encontrada.", task))
}

#[utoipa::path(
    post,
    path = "/task-management/task",
    tag = "Task Management",
    request_body = TaskPayload,
    responses(
        (status = 201, description = "Tarefa criada no fim do quadro", body = TaskDetail),
        (status = 404, description = "Quadro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<TaskCreate>,
    ValidatedJson(payload): ValidatedJson<TaskPayload>,
) -> Result<ApiResponse<TaskDetail>, AppError> {
    let task = app_state.task_service.create_task(&user, payload).await?;
    Ok(ApiResponse::created("Tarefa criada com sucesso.", task))
}

#[utoipa::path(
    put,
    path = "/task-management/task/{id}",
    tag = "Task Management",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    request_body = TaskPayload,
    responses(
        (status = 200, description = "Tarefa atualizada", body = TaskDetail),
        (status = 404, description = "Tarefa ou quadro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_task(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<TaskUpdate>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<TaskPayload>,
) -> Result<ApiResponse<TaskDetail>, AppError> {
    let task = app_state.task_service.update_task(&user, id, payload).await?;
    Ok(ApiResponse::ok("Tarefa atualizada com sucesso.", task))
}

#[utoipa::path(
    delete,
    path = "/task-management/task/{id}",
    tag = "Task Management",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa removida"),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_task(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<TaskDelete>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    app_state.task_service.delete_task(&user, id).await?;
    Ok(ApiResponse::message(StatusCode::OK, "Tarefa removida com sucesso."))
}
