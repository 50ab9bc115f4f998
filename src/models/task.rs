// src/models/task.rs

use chrono::NaiveDate;
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
    models::user::User,
    services::reconcile::Reconcilable,
};

fn active() -> bool {
    true
}

// --- Quadros ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TaskBoard {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub stamps: Stamps,
}

impl Record for TaskBoard {
    const TABLE: &'static str = "task_boards";
    const ENTITY: &'static str = "Quadro de tarefas";
    const COLUMNS: &'static [&'static str] = &["title", "description", "is_active"];
    const ORDER_BY: &'static str = "title, id";
    // Atribuições das tarefas primeiro, depois as próprias tarefas
    const DEPENDENTS: &'static [Cascade] = &[
        Cascade::Through {
            table: "task_users",
            column: "task_id",
            through: "tasks",
            through_column: "board_id",
        },
        Cascade::Direct { table: "tasks", column: "board_id" },
    ];

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
            .bind(self.title.clone())
            .bind(self.description.clone())
            .bind(self.is_active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TaskBoardColumn {
    pub id: Uuid,
    pub company_id: Uuid,
    pub task_board_id: Uuid,
    pub column_name: String,
    pub sequence_no: i32,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub stamps: Stamps,
}

impl Record for TaskBoardColumn {
    const TABLE: &'static str = "task_board_columns";
    const ENTITY: &'static str = "Coluna do quadro";
    const COLUMNS: &'static [&'static str] = &["task_board_id", "column_name", "sequence_no"];
    const ORDER_BY: &'static str = "sequence_no, id";

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
            .bind(self.task_board_id)
            .bind(self.column_name.clone())
            .bind(self.sequence_no)
    }
}

impl ChildRecord for TaskBoardColumn {
    const PARENT_COLUMN: &'static str = "task_board_id";

    fn parent_id(&self) -> Uuid {
        self.task_board_id
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TaskBoardPayload {
    #[validate(length(min = 1, max = 120, message = "O título deve ter entre 1 e 120 caracteres."))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    #[validate(nested)]
    pub columns: Vec<TaskBoardColumnItem>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TaskBoardColumnItem {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(length(min = 1, message = "O nome da coluna é obrigatório."))]
    pub column_name: String,
    #[serde(default)]
    pub sequence_no: i32,
}

impl AggregateDraft for TaskBoardPayload {
    type Row = TaskBoard;
    type Child = TaskBoardColumnItem;

    fn take_children(&mut self) -> Vec<TaskBoardColumnItem> {
        std::mem::take(&mut self.columns)
    }

    fn build(self, meta: RowMeta, _previous: Option<&TaskBoard>) -> TaskBoard {
        TaskBoard {
            id: meta.id,
            company_id: meta.company_id,
            title: self.title,
            description: self.description,
            is_active: self.is_active,
            stamps: meta.stamps,
        }
    }
}

impl Reconcilable for TaskBoardColumnItem {
    const FIELD: &'static str = "columns";

    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

impl ChildDraft for TaskBoardColumnItem {
    type Row = TaskBoardColumn;

    fn build(self, meta: RowMeta, parent_id: Uuid) -> TaskBoardColumn {
        TaskBoardColumn {
            id: meta.id,
            company_id: meta.company_id,
            task_board_id: parent_id,
            column_name: self.column_name,
            sequence_no: self.sequence_no,
            stamps: meta.stamps,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskBoardDetail {
    #[serde(flatten)]
    pub board: TaskBoard,
    pub columns: Vec<TaskBoardColumn>,
}

impl From<Aggregate<TaskBoard, TaskBoardColumn>> for TaskBoardDetail {
    fn from(aggregate: Aggregate<TaskBoard, TaskBoardColumn>) -> Self {
        Self { board: aggregate.parent, columns: aggregate.children }
    }
}

// --- Tarefas ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub company_id: Uuid,
    pub board_id: Uuid,
    pub column_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub priority: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub sequence_no: i32,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub stamps: Stamps,
}

impl Task {
    pub const BOARD_COLUMN: &'static str = "board_id";
}

impl Record for Task {
    const TABLE: &'static str = "tasks";
    const ENTITY: &'static str = "Tarefa";
    const COLUMNS: &'static [&'static str] = &[
        "board_id",
        "column_id",
        "title",
        "description",
        "is_active",
        "priority",
        "start_date",
        "target_date",
        "sequence_no",
    ];
    const ORDER_BY: &'static str = "sequence_no, id";

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
            .bind(self.board_id)
            .bind(self.column_id)
            .bind(self.title.clone())
            .bind(self.description.clone())
            .bind(self.is_active)
            .bind(self.priority.clone())
            .bind(self.start_date)
            .bind(self.target_date)
            .bind(self.sequence_no)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TaskUser {
    pub id: Uuid,
    pub company_id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub stamps: Stamps,
}

impl Record for TaskUser {
    const TABLE: &'static str = "task_users";
    const ENTITY: &'static str = "Responsável da tarefa";
    const COLUMNS: &'static [&'static str] = &["task_id", "user_id"];

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
        query.bind(self.task_id).bind(self.user_id)
    }
}

impl ChildRecord for TaskUser {
    const PARENT_COLUMN: &'static str = "task_id";

    fn parent_id(&self) -> Uuid {
        self.task_id
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TaskPayload {
    pub board_id: Uuid,
    #[serde(default)]
    pub column_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "O título deve ter entre 1 e 200 caracteres."))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "active")]
    pub is_active: bool,
    pub priority: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(nested)]
    pub users: Vec<TaskUserItem>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TaskUserItem {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
}

/// Tarefa nova com a posição já calculada no quadro.
pub struct NewTask {
    pub payload: TaskPayload,
    pub sequence_no: i32,
}

impl TaskPayload {
    /// Quadro e coluna citados pela tarefa.
    fn board_references(&self) -> Vec<Reference> {
        let mut references = vec![Reference::to::<TaskBoard>(self.board_id)];
        references.extend(self.column_id.map(Reference::to::<TaskBoardColumn>));
        references
    }

    fn into_task(self, meta: RowMeta, sequence_no: i32) -> Task {
        Task {
            id: meta.id,
            company_id: meta.company_id,
            board_id: self.board_id,
            column_id: self.column_id,
            title: self.title,
            description: self.description,
            is_active: self.is_active,
            priority: self.priority,
            start_date: self.start_date,
            target_date: self.target_date,
            sequence_no,
            stamps: meta.stamps,
        }
    }
}

impl AggregateDraft for NewTask {
    type Row = Task;
    type Child = TaskUserItem;

    fn take_children(&mut self) -> Vec<TaskUserItem> {
        std::mem::take(&mut self.payload.users)
    }

    fn references(&self) -> Vec<Reference> {
        self.payload.board_references()
    }

    fn build(self, meta: RowMeta, _previous: Option<&Task>) -> Task {
        self.payload.into_task(meta, self.sequence_no)
    }
}

impl AggregateDraft for TaskPayload {
    type Row = Task;
    type Child = TaskUserItem;

    fn take_children(&mut self) -> Vec<TaskUserItem> {
        std::mem::take(&mut self.users)
    }

    fn references(&self) -> Vec<Reference> {
        self.board_references()
    }

    fn build(self, meta: RowMeta, previous: Option<&Task>) -> Task {
        let sequence_no = previous.map_or(1, |task| task.sequence_no);
        self.into_task(meta, sequence_no)
    }
}

impl Reconcilable for TaskUserItem {
    const FIELD: &'static str = "users";

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn natural_key(&self) -> Option<String> {
        Some(self.user_id.to_string())
    }
}

impl ChildDraft for TaskUserItem {
    type Row = TaskUser;

    fn references(&self) -> Vec<Reference> {
        vec![Reference::to::<User>(self.user_id)]
    }

    fn build(self, meta: RowMeta, parent_id: Uuid) -> TaskUser {
        TaskUser {
            id: meta.id,
            company_id: meta.company_id,
            task_id: parent_id,
            user_id: self.user_id,
            stamps: meta.stamps,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub users: Vec<TaskUser>,
}

impl From<Aggregate<Task, TaskUser>> for TaskDetail {
    fn from(aggregate: Aggregate<Task, TaskUser>) -> Self {
        Self { task: aggregate.parent, users: aggregate.children }
    }
}
