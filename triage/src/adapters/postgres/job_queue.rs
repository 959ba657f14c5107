//! PostgreSQL adapter for TaskQueue
//!
//! Jobs are rows in the `jobs` table. A worker reserves the oldest pending
//! row with `FOR UPDATE SKIP LOCKED`, so concurrent workers never take the
//! same job. Finished jobs are deleted; failed ones stay with their last
//! error. Reservations older than `stale_after` count as abandoned and are
//! handed out again.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{LockBehavior, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{JobId, QueuedTask, Task};
use crate::domain::ports::TaskQueue;
use crate::entity::jobs::{self, STATUS_FAILED, STATUS_PENDING, STATUS_RESERVED};
use crate::error::DomainError;

/// Default age after which a reserved job is handed out again
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(15 * 60);

/// PostgreSQL implementation of TaskQueue
pub struct PostgresJobQueue {
    db: DatabaseConnection,
    stale_after: Duration,
}

impl PostgresJobQueue {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    #[allow(dead_code)]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    fn stale_cutoff(&self) -> Result<chrono::DateTime<chrono::FixedOffset>, DomainError> {
        let age = chrono::Duration::from_std(self.stale_after)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok((Utc::now() - age).fixed_offset())
    }
}

#[async_trait]
impl TaskQueue for PostgresJobQueue {
    async fn enqueue(&self, task: &Task) -> Result<JobId, DomainError> {
        let payload =
            serde_json::to_value(task).map_err(|e| DomainError::Queue(e.to_string()))?;
        let id = Uuid::new_v4();

        jobs::ActiveModel {
            id: Set(id),
            kind: Set(task.kind().to_string()),
            payload: Set(payload),
            status: Set(STATUS_PENDING.to_string()),
            attempts: Set(0),
            last_error: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
            reserved_at: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(|e| DomainError::Queue(e.to_string()))?;

        Ok(JobId(id))
    }

    async fn reserve(&self) -> Result<Option<QueuedTask>, DomainError> {
        let cutoff = self.stale_cutoff()?;
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Queue(e.to_string()))?;

        let job = jobs::Entity::find()
            .filter(
                Condition::any()
                    .add(jobs::Column::Status.eq(STATUS_PENDING))
                    .add(
                        Condition::all()
                            .add(jobs::Column::Status.eq(STATUS_RESERVED))
                            .add(jobs::Column::ReservedAt.lt(cutoff)),
                    ),
            )
            .order_by_asc(jobs::Column::CreatedAt)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .one(&txn)
            .await
            .map_err(|e| DomainError::Queue(e.to_string()))?;

        let Some(job) = job else {
            txn.commit()
                .await
                .map_err(|e| DomainError::Queue(e.to_string()))?;
            return Ok(None);
        };

        let attempts = job.attempts + 1;
        let mut active: jobs::ActiveModel = job.into();
        active.status = Set(STATUS_RESERVED.to_string());
        active.attempts = Set(attempts);
        active.reserved_at = Set(Some(Utc::now().fixed_offset()));
        let job = active
            .update(&txn)
            .await
            .map_err(|e| DomainError::Queue(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Queue(e.to_string()))?;

        let task: Task = match serde_json::from_value(job.payload.clone()) {
            Ok(task) => task,
            Err(e) => {
                let error = format!("Undecodable payload: {}", e);
                self.fail(&JobId(job.id), &error).await?;
                return Err(DomainError::Queue(error));
            }
        };

        Ok(Some(QueuedTask {
            id: JobId(job.id),
            task,
            attempts: job.attempts,
            created_at: job.created_at.with_timezone(&Utc),
        }))
    }

    async fn complete(&self, id: &JobId) -> Result<(), DomainError> {
        jobs::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Queue(e.to_string()))?;

        Ok(())
    }

    async fn fail(&self, id: &JobId, error: &str) -> Result<(), DomainError> {
        jobs::ActiveModel {
            id: Set(id.0),
            status: Set(STATUS_FAILED.to_string()),
            last_error: Set(Some(error.to_string())),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Queue(e.to_string()))?;

        Ok(())
    }
}
