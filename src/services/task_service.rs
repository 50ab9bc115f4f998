// src/services/task_service.rs

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::{
        record::{Aggregate, Record},
        store::{PgStorage, Storage, StorageTx},
    },
    models::{
        auth::Principal,
        task::{
            NewTask, Task, TaskBoard, TaskBoardColumn, TaskBoardDetail, TaskBoardPayload,
            TaskDetail, TaskPayload, TaskUser,
        },
    },
    services::pipeline::{Mutation, MutationPipeline},
};

#[derive(Clone)]
pub struct TaskService<D: Storage = PgStorage> {
    pipeline: MutationPipeline<D>,
}

impl<D: Storage> TaskService<D> {
    pub fn new(pipeline: MutationPipeline<D>) -> Self {
        Self { pipeline }
    }

    // --- Quadros ---

    pub async fn list_boards(&self, principal: &Principal) -> Result<Vec<TaskBoard>, AppError> {
        self.pipeline.list(principal).await
    }

    pub async fn paginate_boards(
        &self,
        principal: &Principal,
        request: PageRequest,
    ) -> Result<Page<TaskBoard>, AppError> {
        self.pipeline.paginate(principal, request).await
    }

    pub async fn fetch_board(&self, principal: &Principal, id: Uuid) -> Result<TaskBoardDetail, AppError> {
        let aggregate = self
            .pipeline
            .fetch::<TaskBoard, TaskBoardColumn>(principal, id)
            .await?;
        Ok(aggregate.into())
    }

    pub async fn create_board(
        &self,
        principal: &Principal,
        payload: TaskBoardPayload,
    ) -> Result<TaskBoardDetail, AppError> {
        let aggregate = self.pipeline.create(principal, payload).await?;
        tracing::info!(board_id = %aggregate.parent.id, "📋 Quadro de tarefas criado");
        Ok(aggregate.into())
    }

    pub async fn update_board(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: TaskBoardPayload,
    ) -> Result<TaskBoardDetail, AppError> {
        let aggregate = self.pipeline.update(principal, id, payload).await?;
        Ok(aggregate.into())
    }

    /// Remove também as tarefas do quadro e seus responsáveis.
    pub async fn delete_board(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        self.pipeline
            .delete::<TaskBoard, TaskBoardColumn>(principal, id)
            .await?;
        tracing::info!(board_id = %id, "Quadro de tarefas removido");
        Ok(())
    }

    pub async fn tasks_by_board(&self, principal: &Principal, board_id: Uuid) -> Result<Vec<Task>, AppError> {
        if !self.pipeline.exists::<TaskBoard>(principal, board_id).await? {
            return Err(AppError::NotFound(TaskBoard::ENTITY));
        }
        self.pipeline
            .list_by(principal, Task::BOARD_COLUMN, board_id)
            .await
    }

    // --- Tarefas ---

    pub async fn list_tasks(&self, principal: &Principal) -> Result<Vec<Task>, AppError> {
        self.pipeline.list(principal).await
    }

    pub async fn fetch_task(&self, principal: &Principal, id: Uuid) -> Result<TaskDetail, AppError> {
        let aggregate = self.pipeline.fetch::<Task, TaskUser>(principal, id).await?;
        Ok(aggregate.into())
    }

    pub async fn create_task(&self, principal: &Principal, payload: TaskPayload) -> Result<TaskDetail, AppError> {
        let mut mutation = self.pipeline.begin(principal).await?;
        let result = insert_task(&mut mutation, payload).await;
        let aggregate = mutation.settle(result).await?;

        tracing::info!(
            task_id = %aggregate.parent.id,
            sequence_no = aggregate.parent.sequence_no,
            "📝 Tarefa criada"
        );
        Ok(aggregate.into())
    }

    pub async fn update_task(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: TaskPayload,
    ) -> Result<TaskDetail, AppError> {
        let aggregate = self.pipeline.update(principal, id, payload).await?;
        Ok(aggregate.into())
    }

    pub async fn delete_task(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        self.pipeline.delete::<Task, TaskUser>(principal, id).await?;
        tracing::info!(task_id = %id, "Tarefa removida");
        Ok(())
    }
}

// Posição = quantidade de tarefas já no quadro + 1.
// O quadro, a coluna e os responsáveis são conferidos no insert do agregado.
async fn insert_task<T: StorageTx>(
    mutation: &mut Mutation<'_, T>,
    payload: TaskPayload,
) -> Result<Aggregate<Task, TaskUser>, AppError> {
    let company_id = mutation.company_id();
    let count = mutation
        .store()
        .count_by::<Task>(company_id, Task::BOARD_COLUMN, payload.board_id)
        .await?;
    let sequence_no = i32::try_from(count + 1).map_err(|e| AppError::InternalServerError(e.into()))?;

    mutation
        .insert_aggregate(NewTask { payload, sequence_no })
        .await
}
