// src/db/template_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::schedule::{NewTemplate, RecurringTemplate, TemplateSelector},
};

const TEMPLATE_COLUMNS: &str = "id, group_id, teacher_id, subject_id, weekday, start_hour, start_minute, \
     duration_minutes, timezone, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, new: &NewTemplate) -> Result<RecurringTemplate, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let template = sqlx::query_as::<_, RecurringTemplate>(&format!(
            r#"
            INSERT INTO recurring_templates (
                group_id, teacher_id, subject_id, weekday, start_hour, start_minute,
                duration_minutes, timezone, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(new.group_id)
        .bind(new.teacher_id)
        .bind(new.subject_id)
        .bind(new.weekday)
        .bind(new.start_hour)
        .bind(new.start_minute)
        .bind(new.duration_minutes)
        .bind(&new.timezone)
        .fetch_one(executor)
        .await?;

        Ok(template)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<RecurringTemplate>, AppError> {
        let template = sqlx::query_as::<_, RecurringTemplate>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM recurring_templates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(template)
    }

    pub async fn list_by_teacher(&self, teacher_id: i64) -> Result<Vec<RecurringTemplate>, AppError> {
        let templates = sqlx::query_as::<_, RecurringTemplate>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS} FROM recurring_templates
            WHERE teacher_id = $1
            ORDER BY weekday, start_hour, start_minute
            "#
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    pub async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<RecurringTemplate>, AppError> {
        let templates = sqlx::query_as::<_, RecurringTemplate>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS} FROM recurring_templates
            WHERE group_id = $1
            ORDER BY weekday, start_hour, start_minute
            "#
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    pub async fn list_active(&self) -> Result<Vec<RecurringTemplate>, AppError> {
        let templates = sqlx::query_as::<_, RecurringTemplate>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS} FROM recurring_templates
            WHERE is_active = TRUE
            ORDER BY weekday, start_hour, start_minute
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    pub async fn deactivate<'e, E>(&self, executor: E, selector: TemplateSelector) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = match selector {
            TemplateSelector::One(id) => {
                sqlx::query("UPDATE recurring_templates SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                    .bind(id)
                    .execute(executor)
                    .await?
            }
            TemplateSelector::Group(group_id) => {
                sqlx::query(
                    "UPDATE recurring_templates SET is_active = FALSE, updated_at = NOW() WHERE group_id = $1",
                )
                .bind(group_id)
                .execute(executor)
                .await?
            }
        };

        Ok(result.rows_affected())
    }

    // schedule_slots.template_id tem ON DELETE SET NULL: os slots sobrevivem.
    pub async fn delete<'e, E>(&self, executor: E, selector: TemplateSelector) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = match selector {
            TemplateSelector::One(id) => {
                sqlx::query("DELETE FROM recurring_templates WHERE id = $1")
                    .bind(id)
                    .execute(executor)
                    .await?
            }
            TemplateSelector::Group(group_id) => {
                sqlx::query("DELETE FROM recurring_templates WHERE group_id = $1")
                    .bind(group_id)
                    .execute(executor)
                    .await?
            }
        };

        Ok(result.rows_affected())
    }
}
