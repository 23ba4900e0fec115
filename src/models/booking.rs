// src/models/booking.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Canceled,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingAction {
    Approve,
    Reject,
    Cancel,
    Complete,
}

impl BookingAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            BookingAction::Approve => "approve",
            BookingAction::Reject => "reject",
            BookingAction::Cancel => "cancel",
            BookingAction::Complete => "complete",
        }
    }
}

impl BookingStatus {
    /// Tabela de transições da reserva.
    pub const fn next(self, action: BookingAction) -> Option<BookingStatus> {
        match (self, action) {
            (BookingStatus::Pending, BookingAction::Approve) => Some(BookingStatus::Confirmed),
            (BookingStatus::Pending, BookingAction::Reject) => Some(BookingStatus::Rejected),
            (BookingStatus::Pending | BookingStatus::Confirmed, BookingAction::Cancel) => {
                Some(BookingStatus::Canceled)
            }
            (BookingStatus::Confirmed, BookingAction::Complete) => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    /// Reservas ativas seguram o slot em `booked`.
    pub const fn is_active(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Canceled => "canceled",
            BookingStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for BookingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[schema(example = 7)]
    pub id: i64,
    pub student_id: i64,
    pub teacher_id: i64,
    pub subject_id: i64,
    #[schema(example = 42)]
    pub slot_id: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub student_id: i64,
    pub teacher_id: i64,
    pub subject_id: i64,
    pub slot_id: i64,
    pub status: BookingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_accept_no_action() {
        let actions = [
            BookingAction::Approve,
            BookingAction::Reject,
            BookingAction::Cancel,
            BookingAction::Complete,
        ];
        for status in [BookingStatus::Completed, BookingStatus::Canceled, BookingStatus::Rejected] {
            for action in actions {
                assert_eq!(status.next(action), None, "{status:?} --{action:?}-->");
            }
        }
    }

    #[test]
    fn confirmed_can_only_be_canceled_or_completed() {
        assert_eq!(BookingStatus::Confirmed.next(BookingAction::Approve), None);
        assert_eq!(BookingStatus::Confirmed.next(BookingAction::Reject), None);
        assert_eq!(
            BookingStatus::Confirmed.next(BookingAction::Cancel),
            Some(BookingStatus::Canceled)
        );
        assert_eq!(
            BookingStatus::Confirmed.next(BookingAction::Complete),
            Some(BookingStatus::Completed)
        );
    }
}
