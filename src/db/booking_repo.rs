// src/db/booking_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::{AppError, ConflictReason},
    models::booking::{Booking, BookingStatus, NewBooking},
};

const BOOKING_COLUMNS: &str =
    "id, student_id, teacher_id, subject_id, slot_id, status, created_at, updated_at";

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, new: &NewBooking, now: DateTime<Utc>) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings (student_id, teacher_id, subject_id, slot_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(new.student_id)
        .bind(new.teacher_id)
        .bind(new.subject_id)
        .bind(new.slot_id)
        .bind(new.status)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // Índice parcial: só uma reserva ativa por slot
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(ConflictReason::SlotUnavailable);
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    pub async fn find_active_by_slot<'e, E>(&self, executor: E, slot_id: i64) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE slot_id = $1 AND status IN ('pending', 'confirmed')
            "#
        ))
        .bind(slot_id)
        .fetch_optional(executor)
        .await?;

        Ok(booking)
    }

    /// Como `find_active_by_slot`, mas trava a linha até o fim da transação.
    pub async fn lock_active_by_slot<'e, E>(&self, executor: E, slot_id: i64) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE slot_id = $1 AND status IN ('pending', 'confirmed')
            FOR UPDATE
            "#
        ))
        .bind(slot_id)
        .fetch_optional(executor)
        .await?;

        Ok(booking)
    }

    pub async fn list_pending_by_teacher(&self, teacher_id: i64) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE teacher_id = $1 AND status = 'pending'
            ORDER BY created_at
            "#
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn list_by_student(&self, student_id: i64) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE student_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn list_by_teacher(&self, teacher_id: i64) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE teacher_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Atualiza o status apenas se ainda estiver em `expected`.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        booking_id: i64,
        expected: BookingStatus,
        next: BookingStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET status = $1, updated_at = $2
            WHERE id = $3 AND status = $4
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(next)
        .bind(now)
        .bind(booking_id)
        .bind(expected)
        .fetch_optional(executor)
        .await?;

        Ok(booking)
    }
}
