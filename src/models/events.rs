// src/models/events.rs

use serde::Serialize;

use crate::models::{booking::Booking, schedule::Slot};

/// Eventos de domínio publicados para a camada de notificações.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    BookingCreated { booking: Booking, slot: Slot },
    BookingApproved { booking: Booking },
    BookingRejected { booking: Booking },
    #[serde(rename_all = "camelCase")]
    BookingCanceled { booking: Booking, canceled_by: i64 },
    #[serde(rename_all = "camelCase")]
    SlotWithdrawn { slot: Slot, canceled_booking: Option<Booking> },
    #[serde(rename_all = "camelCase")]
    SlotsMaterialized { template_id: i64, teacher_id: i64, count: usize },
}

impl DomainEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            DomainEvent::BookingCreated { .. } => "booking_created",
            DomainEvent::BookingApproved { .. } => "booking_approved",
            DomainEvent::BookingRejected { .. } => "booking_rejected",
            DomainEvent::BookingCanceled { .. } => "booking_canceled",
            DomainEvent::SlotWithdrawn { .. } => "slot_withdrawn",
            DomainEvent::SlotsMaterialized { .. } => "slots_materialized",
        }
    }
}
