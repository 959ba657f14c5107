//! Table creation for the `migrate` command

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DatabaseConnection, Schema};

use crate::entity::{jobs, tickets};
use crate::error::DomainError;

/// Create the `tickets` and `jobs` tables and their indexes if absent
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DomainError> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut tables = [
        schema.create_table_from_entity(tickets::Entity),
        schema.create_table_from_entity(jobs::Entity),
    ];
    for table in tables.iter_mut() {
        db.execute(backend.build(table.if_not_exists()))
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;
    }

    let indexes = [
        Index::create()
            .if_not_exists()
            .name("idx_tickets_created_at")
            .table(tickets::Entity)
            .col(tickets::Column::CreatedAt)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_jobs_status_created_at")
            .table(jobs::Entity)
            .col(jobs::Column::Status)
            .col(jobs::Column::CreatedAt)
            .to_owned(),
    ];
    for index in &indexes {
        db.execute(backend.build(index))
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;
    }

    tracing::info!("Database schema is up to date");
    Ok(())
}
