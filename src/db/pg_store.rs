// src/db/pg_store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, ConflictReason},
    db::{
        store::{BookingStore, SlotStore, TemplateStore},
        BookingRepository, SlotRepository, TemplateRepository,
    },
    models::{
        booking::{Booking, BookingStatus, NewBooking},
        schedule::{NewSlot, NewTemplate, RecurringTemplate, Slot, SlotStatus, TemplateSelector},
    },
};

/// Store de produção: junta os repositórios e abre as transações que
/// envolvem slot e reserva ao mesmo tempo.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    templates: TemplateRepository,
    slots: SlotRepository,
    bookings: BookingRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            templates: TemplateRepository::new(pool.clone()),
            slots: SlotRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl TemplateStore for PgStore {
    async fn insert_template(&self, new: &NewTemplate) -> Result<RecurringTemplate, AppError> {
        self.templates.create(&self.pool, new).await
    }

    async fn find_template(&self, id: i64) -> Result<Option<RecurringTemplate>, AppError> {
        self.templates.find_by_id(id).await
    }

    async fn list_templates_by_teacher(&self, teacher_id: i64) -> Result<Vec<RecurringTemplate>, AppError> {
        self.templates.list_by_teacher(teacher_id).await
    }

    async fn list_templates_by_group(&self, group_id: Uuid) -> Result<Vec<RecurringTemplate>, AppError> {
        self.templates.list_by_group(group_id).await
    }

    async fn list_active_templates(&self) -> Result<Vec<RecurringTemplate>, AppError> {
        self.templates.list_active().await
    }

    async fn deactivate_templates(&self, selector: TemplateSelector) -> Result<u64, AppError> {
        self.templates.deactivate(&self.pool, selector).await
    }

    async fn delete_templates(&self, selector: TemplateSelector) -> Result<u64, AppError> {
        self.templates.delete(&self.pool, selector).await
    }
}

#[async_trait]
impl SlotStore for PgStore {
    async fn insert_slot(&self, new: &NewSlot) -> Result<Slot, AppError> {
        self.slots.create(new).await
    }

    async fn slot_exists(&self, teacher_id: i64, start_time: DateTime<Utc>) -> Result<bool, AppError> {
        self.slots.exists(teacher_id, start_time).await
    }

    async fn find_slot(&self, id: i64) -> Result<Option<Slot>, AppError> {
        self.slots.find_by_id(id).await
    }

    async fn list_free_slots(
        &self,
        subject_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AppError> {
        self.slots.list_free(subject_id, from, to).await
    }

    async fn list_teacher_slots(
        &self,
        teacher_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AppError> {
        self.slots.list_by_teacher(teacher_id, from, to).await
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn find_booking(&self, id: i64) -> Result<Option<Booking>, AppError> {
        self.bookings.find_by_id(id).await
    }

    async fn find_active_booking_for_slot(&self, slot_id: i64) -> Result<Option<Booking>, AppError> {
        self.bookings.find_active_by_slot(&self.pool, slot_id).await
    }

    async fn list_pending_bookings(&self, teacher_id: i64) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_pending_by_teacher(teacher_id).await
    }

    async fn list_student_bookings(&self, student_id: i64) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_by_student(student_id).await
    }

    async fn list_teacher_bookings(&self, teacher_id: i64) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_by_teacher(teacher_id).await
    }

    async fn reserve_slot(&self, new: &NewBooking, now: DateTime<Utc>) -> Result<(Slot, Booking), AppError> {
        // 1. Transação: ou slot e reserva mudam juntos, ou nada muda
        let mut tx = self.pool.begin().await?;

        // 2. UPDATE condicionado a status = 'free'. Quem perde a corrida recebe None.
        let Some(slot) = self.slots.mark_booked(&mut *tx, new.slot_id, new.student_id).await? else {
            return Err(ConflictReason::SlotUnavailable.into());
        };

        // 3. Cria a reserva
        let booking = self.bookings.create(&mut *tx, new, now).await?;

        tx.commit().await?;
        Ok((slot, booking))
    }

    async fn transition_booking(
        &self,
        booking_id: i64,
        expected: BookingStatus,
        next: BookingStatus,
        release_slot: bool,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        // Ordem de travas: slot antes da reserva, como em `reserve_slot` e `withdraw_slot`.
        if release_slot && self.slots.lock_for_booking(&mut *tx, booking_id).await?.is_none() {
            return Err(ConflictReason::StaleState.into());
        }

        let Some(booking) = self
            .bookings
            .update_status(&mut *tx, booking_id, expected, next, now)
            .await?
        else {
            return Err(ConflictReason::StaleState.into());
        };

        if release_slot && self.slots.release(&mut *tx, booking.slot_id).await?.is_none() {
            // Slot já não estava `booked`: não deixamos a reserva mudar sozinha.
            return Err(ConflictReason::StaleState.into());
        }

        tx.commit().await?;
        Ok(booking)
    }

    async fn withdraw_slot(
        &self,
        slot_id: i64,
        expected: SlotStatus,
        now: DateTime<Utc>,
    ) -> Result<(Slot, Option<Booking>), AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(slot) = self.slots.mark_canceled(&mut *tx, slot_id, expected).await? else {
            return Err(ConflictReason::StaleState.into());
        };

        let mut canceled_booking = None;
        if expected == SlotStatus::Booked {
            // Com o slot já travado, a reserva ativa é travada e lida na versão mais recente.
            if let Some(active) = self.bookings.lock_active_by_slot(&mut *tx, slot_id).await? {
                let Some(canceled) = self
                    .bookings
                    .update_status(&mut *tx, active.id, active.status, BookingStatus::Canceled, now)
                    .await?
                else {
                    return Err(ConflictReason::StaleState.into());
                };
                canceled_booking = Some(canceled);
            }
        }

        tx.commit().await?;
        Ok((slot, canceled_booking))
    }
}
