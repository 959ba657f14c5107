//! PostgreSQL adapter for TicketRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    Category, ClassificationUpdate, NewTicket, PageRequest, Ticket, TicketChanges, TicketFilter,
    TicketId, TicketPage, TicketStats, TicketStatus, LOW_CONFIDENCE_THRESHOLD,
};
use crate::domain::ports::{TicketRepository, TicketScope};
use crate::entity::tickets;
use crate::error::DomainError;

/// PostgreSQL implementation of TicketRepository
pub struct PostgresTicketRepository {
    db: DatabaseConnection,
}

impl PostgresTicketRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn filtered(filter: &TicketFilter) -> Select<tickets::Entity> {
        let mut query = tickets::Entity::find();
        if let Some(term) = filter.search_term() {
            let pattern = format!("%{}%", escape_like(term));
            query = query.filter(
                Condition::any()
                    .add(Expr::col(tickets::Column::Subject).ilike(pattern.clone()))
                    .add(Expr::col(tickets::Column::Body).ilike(pattern)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(tickets::Column::Status.eq(status.to_string()));
        }
        if let Some(category) = filter.category {
            query = query.filter(tickets::Column::Category.eq(category.key()));
        }
        query
    }

    async fn count_by(
        &self,
        column: tickets::Column,
    ) -> Result<Vec<(String, i64)>, DomainError> {
        tickets::Entity::find()
            .filter(column.is_not_null())
            .select_only()
            .column(column)
            .column_as(Expr::col(tickets::Column::Id).count(), "count")
            .group_by(column)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    fn ensure_updated(id: &TicketId, rows_affected: u64) -> Result<(), DomainError> {
        if rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Ticket {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl TicketRepository for PostgresTicketRepository {
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, DomainError> {
        let result = tickets::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_for_classification(
        &self,
        scope: TicketScope,
    ) -> Result<Vec<Ticket>, DomainError> {
        let mut query = tickets::Entity::find();
        if scope == TicketScope::NeedsClassification {
            query = query.filter(
                Condition::any()
                    .add(tickets::Column::Category.is_null())
                    .add(tickets::Column::Confidence.lt(LOW_CONFIDENCE_THRESHOLD)),
            );
        }

        let results = query
            .order_by_asc(tickets::Column::CreatedAt)
            .order_by_asc(tickets::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn list(
        &self,
        filter: &TicketFilter,
        page: &PageRequest,
    ) -> Result<TicketPage, DomainError> {
        let total = Self::filtered(filter)
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let results = Self::filtered(filter)
            .order_by_desc(tickets::Column::CreatedAt)
            .order_by_desc(tickets::Column::Id)
            .offset(page.offset())
            .limit(page.per_page)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(TicketPage {
            tickets: results.into_iter().map(|m| m.into()).collect(),
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn stats(&self) -> Result<TicketStats, DomainError> {
        let total_tickets = tickets::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let classified_tickets = tickets::Entity::find()
            .filter(tickets::Column::Category.is_not_null())
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let average_confidence: Option<Option<f64>> = tickets::Entity::find()
            .filter(tickets::Column::Confidence.is_not_null())
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(tickets::Column::Confidence))),
                "average",
            )
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let counts = |rows: Vec<(String, i64)>| {
            rows.into_iter()
                .map(|(key, count)| (key, count.max(0) as u64))
                .collect()
        };

        Ok(TicketStats {
            total_tickets,
            by_status: counts(self.count_by(tickets::Column::Status).await?),
            by_category: counts(self.count_by(tickets::Column::Category).await?),
            classified_tickets,
            average_confidence: average_confidence.flatten(),
        })
    }

    async fn create(&self, ticket: &NewTicket) -> Result<Ticket, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = tickets::ActiveModel {
            id: Set(Uuid::new_v4()),
            subject: Set(ticket.subject.clone()),
            body: Set(ticket.body.clone()),
            status: Set(ticket.status.to_string()),
            category: Set(None),
            confidence: Set(None),
            explanation: Set(None),
            note: Set(ticket.note.clone()),
            manually_categorized: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update_classification(
        &self,
        id: &TicketId,
        update: &ClassificationUpdate,
    ) -> Result<(), DomainError> {
        let mut statement = tickets::Entity::update_many()
            .col_expr(
                tickets::Column::Explanation,
                Expr::value(update.explanation.clone()),
            )
            .col_expr(tickets::Column::Confidence, Expr::value(update.confidence))
            .col_expr(
                tickets::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            );

        // Re-checked in the same row update so a manual override made while
        // the classifier was running still wins.
        if let Some(category) = update.category {
            statement = statement.col_expr(
                tickets::Column::Category,
                Expr::case(
                    Expr::col(tickets::Column::ManuallyCategorized).eq(true),
                    Expr::col(tickets::Column::Category),
                )
                .finally(category.key())
                .into(),
            );
        }

        let result = statement
            .filter(tickets::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Self::ensure_updated(id, result.rows_affected)
    }

    async fn set_manual_category(
        &self,
        id: &TicketId,
        category: Category,
    ) -> Result<(), DomainError> {
        let result = tickets::Entity::update_many()
            .col_expr(tickets::Column::Category, Expr::value(category.key()))
            .col_expr(tickets::Column::ManuallyCategorized, Expr::value(true))
            .col_expr(
                tickets::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(tickets::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Self::ensure_updated(id, result.rows_affected)
    }

    async fn update_details(
        &self,
        id: &TicketId,
        changes: &TicketChanges,
    ) -> Result<(), DomainError> {
        let mut statement = tickets::Entity::update_many().col_expr(
            tickets::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        );
        if let Some(status) = changes.status {
            statement = statement.col_expr(tickets::Column::Status, Expr::value(status.to_string()));
        }
        if let Some(note) = &changes.note {
            statement = statement.col_expr(tickets::Column::Note, Expr::value(note.clone()));
        }

        let result = statement
            .filter(tickets::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Self::ensure_updated(id, result.rows_affected)
    }

    async fn clear_manual_flag(&self, id: &TicketId) -> Result<(), DomainError> {
        let result = tickets::Entity::update_many()
            .col_expr(tickets::Column::ManuallyCategorized, Expr::value(false))
            .col_expr(
                tickets::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(tickets::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Self::ensure_updated(id, result.rows_affected)
    }
}

/// Escape LIKE wildcards so search text matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Convert SeaORM model to domain entity
impl From<tickets::Model> for Ticket {
    fn from(model: tickets::Model) -> Self {
        Ticket {
            id: TicketId(model.id),
            subject: model.subject,
            body: model.body,
            status: model.status.parse().unwrap_or(TicketStatus::Open),
            category: model.category.and_then(|c| c.parse().ok()),
            confidence: model.confidence,
            explanation: model.explanation,
            note: model.note,
            manually_categorized: model.manually_categorized,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(category: Option<&str>, status: &str) -> tickets::Model {
        let now = Utc::now().fixed_offset();
        tickets::Model {
            id: Uuid::new_v4(),
            subject: "Subject".to_string(),
            body: "Body".to_string(),
            status: status.to_string(),
            category: category.map(str::to_string),
            confidence: Some(0.7),
            explanation: Some("Because".to_string()),
            note: None,
            manually_categorized: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn model_converts_to_ticket() {
        let ticket: Ticket = model(Some("feature_request"), "in_progress").into();

        assert_eq!(ticket.category, Some(Category::FeatureRequest));
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.confidence, Some(0.7));
        assert!(ticket.manually_categorized);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50% off_now"), "50\\% off\\_now");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn unknown_stored_values_are_tolerated() {
        let ticket: Ticket = model(Some("legacy"), "archived").into();

        assert_eq!(ticket.category, None);
        assert_eq!(ticket.status, TicketStatus::Open);
    }
}
