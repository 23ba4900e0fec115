// src/db/subject_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{common::error::AppError, db::store::SubjectLookup, models::subject::Subject};

// Somente leitura: as disciplinas são cadastradas por outro subsistema.
#[derive(Clone)]
pub struct SubjectRepository {
    pool: PgPool,
}

impl SubjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubjectLookup for SubjectRepository {
    async fn find_subject(&self, id: i64) -> Result<Option<Subject>, AppError> {
        let subject = sqlx::query_as::<_, Subject>(
            r#"
            SELECT id, teacher_id, name, duration_minutes, is_active, requires_booking_approval
            FROM subjects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subject)
    }
}
