// src/services/booking_service.rs

use std::sync::Arc;

use crate::{
    common::{
        clock::Clock,
        error::{AppError, ConflictReason, Entity},
    },
    db::store::{BookingStore, SlotStore, SubjectLookup},
    models::{
        booking::{Booking, BookingAction, BookingStatus, NewBooking},
        events::DomainEvent,
        schedule::SlotStatus,
    },
    services::events::EventBus,
};

#[derive(Clone)]
pub struct BookingService {
    slots: Arc<dyn SlotStore>,
    bookings: Arc<dyn BookingStore>,
    subjects: Arc<dyn SubjectLookup>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl BookingService {
    pub fn new(
        slots: Arc<dyn SlotStore>,
        bookings: Arc<dyn BookingStore>,
        subjects: Arc<dyn SubjectLookup>,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Self {
        Self {
            slots,
            bookings,
            subjects,
            clock,
            events,
        }
    }

    async fn load_booking(&self, booking_id: i64) -> Result<Booking, AppError> {
        self.bookings
            .find_booking(booking_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Booking))
    }

    /// Aplica `action` conforme a tabela de transições, condicionada ao
    /// status lido. Com `release_slot` o slot volta a `free` junto.
    async fn transition(&self, booking: &Booking, action: BookingAction, release_slot: bool) -> Result<Booking, AppError> {
        let next = booking
            .status
            .next(action)
            .ok_or(ConflictReason::InvalidBookingTransition { from: booking.status, action })?;

        self.bookings
            .transition_booking(booking.id, booking.status, next, release_slot, self.clock.now())
            .await
    }

    // =========================================================================
    //  RESERVA
    // =========================================================================

    /// Reserva um slot livre. A reserva nasce `pending` se a disciplina exige
    /// aprovação do professor, senão `confirmed`.
    pub async fn reserve(&self, student_id: i64, slot_id: i64) -> Result<Booking, AppError> {
        // 1. Pré-checagens (a garantia real é o UPDATE condicional do passo 3)
        let slot = self
            .slots
            .find_slot(slot_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Slot))?;

        if slot.status != SlotStatus::Free {
            return Err(ConflictReason::SlotUnavailable.into());
        }
        if slot.start_time <= self.clock.now() {
            return Err(AppError::InvalidTime("O horário deste slot já passou".to_string()));
        }

        // 2. Disciplina define se há etapa de aprovação
        let subject = self
            .subjects
            .find_subject(slot.subject_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Subject))?;

        if !subject.is_active {
            return Err(AppError::InactiveSubject);
        }

        let status = if subject.requires_booking_approval {
            BookingStatus::Pending
        } else {
            BookingStatus::Confirmed
        };

        // 3. free -> booked + reserva, atômicos
        let new = NewBooking {
            student_id,
            teacher_id: slot.teacher_id,
            subject_id: slot.subject_id,
            slot_id,
            status,
        };
        let (slot, booking) = self.bookings.reserve_slot(&new, self.clock.now()).await?;

        tracing::info!(booking_id = booking.id, slot_id, student_id, status = %booking.status, "Reserva criada");
        self.events.publish(DomainEvent::BookingCreated { booking: booking.clone(), slot });
        Ok(booking)
    }

    // =========================================================================
    //  DECISÕES DO PROFESSOR
    // =========================================================================

    pub async fn approve(&self, teacher_id: i64, booking_id: i64) -> Result<Booking, AppError> {
        let booking = self.load_booking(booking_id).await?;
        if booking.teacher_id != teacher_id {
            return Err(AppError::Forbidden);
        }

        // O slot continua `booked`
        let booking = self.transition(&booking, BookingAction::Approve, false).await?;

        tracing::info!(booking_id, teacher_id, "Reserva aprovada");
        self.events.publish(DomainEvent::BookingApproved { booking: booking.clone() });
        Ok(booking)
    }

    pub async fn reject(&self, teacher_id: i64, booking_id: i64) -> Result<Booking, AppError> {
        let booking = self.load_booking(booking_id).await?;
        if booking.teacher_id != teacher_id {
            return Err(AppError::Forbidden);
        }

        let booking = self.transition(&booking, BookingAction::Reject, true).await?;

        tracing::info!(booking_id, teacher_id, "Reserva recusada");
        self.events.publish(DomainEvent::BookingRejected { booking: booking.clone() });
        Ok(booking)
    }

    // =========================================================================
    //  CANCELAMENTO
    // =========================================================================

    /// Aluno ou professor da reserva cancelam; o slot volta a ficar livre.
    pub async fn cancel(&self, actor_id: i64, booking_id: i64) -> Result<Booking, AppError> {
        let booking = self.load_booking(booking_id).await?;
        if actor_id != booking.student_id && actor_id != booking.teacher_id {
            return Err(AppError::Forbidden);
        }

        let booking = self.transition(&booking, BookingAction::Cancel, true).await?;

        tracing::info!(booking_id, actor_id, "Reserva cancelada");
        self.events.publish(DomainEvent::BookingCanceled {
            booking: booking.clone(),
            canceled_by: actor_id,
        });
        Ok(booking)
    }

    /// O professor cancela a reserva ativa de um dos seus slots.
    pub async fn cancel_by_slot(&self, teacher_id: i64, slot_id: i64) -> Result<Booking, AppError> {
        let slot = self
            .slots
            .find_slot(slot_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Slot))?;

        if slot.teacher_id != teacher_id {
            return Err(AppError::Forbidden);
        }

        let booking = self
            .bookings
            .find_active_booking_for_slot(slot_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Booking))?;

        self.cancel(teacher_id, booking.id).await
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn get_pending_bookings(&self, teacher_id: i64) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_pending_bookings(teacher_id).await
    }

    pub async fn get_student_bookings(&self, student_id: i64) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_student_bookings(student_id).await
    }

    pub async fn get_teacher_bookings(&self, teacher_id: i64) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_teacher_bookings(teacher_id).await
    }
}
