// src/db/slot_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::{AppError, ConflictReason},
    models::schedule::{NewSlot, Slot, SlotStatus},
};

const SLOT_COLUMNS: &str =
    "id, teacher_id, subject_id, template_id, start_time, end_time, status, student_id, created_at";

#[derive(Clone)]
pub struct SlotRepository {
    pool: PgPool,
}

impl SlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CRIAÇÃO & CONSULTAS
    // =========================================================================

    pub async fn create(&self, new: &NewSlot) -> Result<Slot, AppError> {
        sqlx::query_as::<_, Slot>(&format!(
            r#"
            INSERT INTO schedule_slots (teacher_id, subject_id, template_id, start_time, end_time, status)
            VALUES ($1, $2, $3, $4, $5, 'free')
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(new.teacher_id)
        .bind(new.subject_id)
        .bind(new.template_id)
        .bind(new.start_time)
        .bind(new.end_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // UNIQUE (teacher_id, start_time) é a garantia definitiva contra duplicatas
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(ConflictReason::DuplicateSlot);
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn exists(&self, teacher_id: i64, start_time: DateTime<Utc>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM schedule_slots
                WHERE teacher_id = $1 AND start_time = $2
            )
            "#,
        )
        .bind(teacher_id)
        .bind(start_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Slot>, AppError> {
        let slot = sqlx::query_as::<_, Slot>(&format!("SELECT {SLOT_COLUMNS} FROM schedule_slots WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(slot)
    }

    pub async fn list_free(
        &self,
        subject_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AppError> {
        let slots = sqlx::query_as::<_, Slot>(&format!(
            r#"
            SELECT {SLOT_COLUMNS} FROM schedule_slots
            WHERE subject_id = $1 AND status = 'free'
              AND start_time >= $2 AND start_time < $3
            ORDER BY start_time
            "#
        ))
        .bind(subject_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    pub async fn list_by_teacher(
        &self,
        teacher_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AppError> {
        let slots = sqlx::query_as::<_, Slot>(&format!(
            r#"
            SELECT {SLOT_COLUMNS} FROM schedule_slots
            WHERE teacher_id = $1 AND start_time >= $2 AND start_time < $3
            ORDER BY start_time
            "#
        ))
        .bind(teacher_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    // =========================================================================
    //  TRANSIÇÕES CONDICIONAIS (usadas dentro de transações)
    // =========================================================================

    /// Trava (`FOR UPDATE`) o slot de uma reserva e devolve o seu id.
    /// Transações que mexem em slot e reserva travam sempre o slot primeiro.
    pub async fn lock_for_booking<'e, E>(&self, executor: E, booking_id: i64) -> Result<Option<i64>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot_id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT s.id
            FROM schedule_slots s
            JOIN bookings b ON b.slot_id = s.id
            WHERE b.id = $1
            FOR UPDATE OF s
            "#,
        )
        .bind(booking_id)
        .fetch_optional(executor)
        .await?;

        Ok(slot_id)
    }

    /// `free -> booked`. Retorna `None` se o slot não estava mais livre.
    pub async fn mark_booked<'e, E>(&self, executor: E, slot_id: i64, student_id: i64) -> Result<Option<Slot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, Slot>(&format!(
            r#"
            UPDATE schedule_slots
            SET status = 'booked', student_id = $1
            WHERE id = $2 AND status = 'free'
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(student_id)
        .bind(slot_id)
        .fetch_optional(executor)
        .await?;

        Ok(slot)
    }

    /// `booked -> free`, limpando o aluno.
    pub async fn release<'e, E>(&self, executor: E, slot_id: i64) -> Result<Option<Slot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, Slot>(&format!(
            r#"
            UPDATE schedule_slots
            SET status = 'free', student_id = NULL
            WHERE id = $1 AND status = 'booked'
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(slot_id)
        .fetch_optional(executor)
        .await?;

        Ok(slot)
    }

    /// `expected -> canceled`. Estado terminal.
    pub async fn mark_canceled<'e, E>(
        &self,
        executor: E,
        slot_id: i64,
        expected: SlotStatus,
    ) -> Result<Option<Slot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, Slot>(&format!(
            r#"
            UPDATE schedule_slots
            SET status = 'canceled', student_id = NULL
            WHERE id = $1 AND status = $2
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(slot_id)
        .bind(expected)
        .fetch_optional(executor)
        .await?;

        Ok(slot)
    }
}
