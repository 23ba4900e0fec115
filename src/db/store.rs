// src/db/store.rs
//
// Interfaces de persistência usadas pelos serviços. `PgStore` é a
// implementação de produção; `MemoryStore` serve aos testes e ao modo local.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        booking::{Booking, BookingStatus, NewBooking},
        schedule::{NewSlot, NewTemplate, RecurringTemplate, Slot, SlotStatus, TemplateSelector},
        subject::Subject,
    },
};

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn insert_template(&self, new: &NewTemplate) -> Result<RecurringTemplate, AppError>;

    async fn find_template(&self, id: i64) -> Result<Option<RecurringTemplate>, AppError>;

    /// Ordenados por dia da semana e horário.
    async fn list_templates_by_teacher(&self, teacher_id: i64) -> Result<Vec<RecurringTemplate>, AppError>;

    async fn list_templates_by_group(&self, group_id: Uuid) -> Result<Vec<RecurringTemplate>, AppError>;

    async fn list_active_templates(&self) -> Result<Vec<RecurringTemplate>, AppError>;

    /// Retorna quantos modelos foram afetados.
    async fn deactivate_templates(&self, selector: TemplateSelector) -> Result<u64, AppError>;

    /// Remoção definitiva. Os slots já gerados ficam, sem a proveniência.
    async fn delete_templates(&self, selector: TemplateSelector) -> Result<u64, AppError>;
}

#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Falha com `Conflict(DuplicateSlot)` se já existir slot em `(teacher_id, start_time)`.
    async fn insert_slot(&self, new: &NewSlot) -> Result<Slot, AppError>;

    async fn slot_exists(&self, teacher_id: i64, start_time: DateTime<Utc>) -> Result<bool, AppError>;

    async fn find_slot(&self, id: i64) -> Result<Option<Slot>, AppError>;

    /// Somente slots livres da disciplina, em ordem cronológica.
    async fn list_free_slots(
        &self,
        subject_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AppError>;

    async fn list_teacher_slots(
        &self,
        teacher_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AppError>;
}

/// Reservas e as unidades atômicas que tocam slot e reserva juntos.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_booking(&self, id: i64) -> Result<Option<Booking>, AppError>;

    async fn find_active_booking_for_slot(&self, slot_id: i64) -> Result<Option<Booking>, AppError>;

    async fn list_pending_bookings(&self, teacher_id: i64) -> Result<Vec<Booking>, AppError>;

    async fn list_student_bookings(&self, student_id: i64) -> Result<Vec<Booking>, AppError>;

    async fn list_teacher_bookings(&self, teacher_id: i64) -> Result<Vec<Booking>, AppError>;

    /// `free -> booked` condicionado a `status = free`, mais a criação da reserva,
    /// na mesma transação. Slot já ocupado: `Conflict(SlotUnavailable)`.
    async fn reserve_slot(&self, new: &NewBooking, now: DateTime<Utc>) -> Result<(Slot, Booking), AppError>;

    /// Troca o status da reserva condicionado a `expected`; com `release_slot`
    /// o slot volta de `booked` para `free` na mesma transação.
    async fn transition_booking(
        &self,
        booking_id: i64,
        expected: BookingStatus,
        next: BookingStatus,
        release_slot: bool,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError>;

    /// Leva o slot a `canceled` (condicionado a `expected`) e cancela a reserva
    /// ativa, se houver.
    async fn withdraw_slot(
        &self,
        slot_id: i64,
        expected: SlotStatus,
        now: DateTime<Utc>,
    ) -> Result<(Slot, Option<Booking>), AppError>;
}

/// Consulta às disciplinas, mantidas por outro subsistema.
#[async_trait]
pub trait SubjectLookup: Send + Sync {
    async fn find_subject(&self, id: i64) -> Result<Option<Subject>, AppError>;
}
