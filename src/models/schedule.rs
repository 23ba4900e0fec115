// src/models/schedule.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "slot_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Free,
    Booked,
    Canceled,
}

/// Ações que movem um slot entre estados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotAction {
    Reserve,
    Release,
    Withdraw,
}

impl SlotStatus {
    /// Tabela de transições permitidas.
    ///
    /// `Canceled` é terminal: um slot retirado pelo professor nunca volta a `Free`,
    /// enquanto um slot `Booked` volta a `Free` quando a reserva é liberada.
    pub const fn next(self, action: SlotAction) -> Option<SlotStatus> {
        match (self, action) {
            (SlotStatus::Free, SlotAction::Reserve) => Some(SlotStatus::Booked),
            (SlotStatus::Booked, SlotAction::Release) => Some(SlotStatus::Free),
            (SlotStatus::Free | SlotStatus::Booked, SlotAction::Withdraw) => Some(SlotStatus::Canceled),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SlotStatus::Free => "free",
            SlotStatus::Booked => "booked",
            SlotStatus::Canceled => "canceled",
        }
    }
}

impl SlotAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            SlotAction::Reserve => "reserve",
            SlotAction::Release => "release",
            SlotAction::Withdraw => "withdraw",
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for SlotAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Modelo recorrente ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTemplate {
    #[schema(example = 12)]
    pub id: i64,
    pub group_id: Uuid,
    pub teacher_id: i64,
    pub subject_id: i64,
    /// 0 = domingo, 6 = sábado
    #[schema(example = 1)]
    pub weekday: i32,
    #[schema(example = 9)]
    pub start_hour: i32,
    #[schema(example = 0)]
    pub start_minute: i32,
    #[schema(example = 60)]
    pub duration_minutes: i32,
    #[schema(example = "Europe/Lisbon")]
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub group_id: Uuid,
    pub teacher_id: i64,
    pub subject_id: i64,
    pub weekday: i32,
    pub start_hour: i32,
    pub start_minute: i32,
    pub duration_minutes: i32,
    pub timezone: String,
}

/// Seleciona um modelo isolado ou um grupo inteiro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSelector {
    One(i64),
    Group(Uuid),
}

/// Horário local de início (hora e minuto).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct TimeOfDay {
    #[schema(example = 9)]
    pub hour: i32,
    #[schema(example = 30)]
    pub minute: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateGroup {
    pub group_id: Uuid,
    pub templates: Vec<RecurringTemplate>,
    #[schema(example = 12)]
    pub seeded_slots: usize,
}

// --- Slots ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[schema(example = 42)]
    pub id: i64,
    pub teacher_id: i64,
    pub subject_id: i64,
    /// Modelo que originou o slot (None para slots avulsos)
    pub template_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
    pub student_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSlot {
    pub teacher_id: i64,
    pub subject_id: i64,
    pub template_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Resultado das criações em lote ("N de M criados").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreationReport {
    #[schema(example = 3)]
    pub created: usize,
    #[schema(example = 4)]
    pub attempted: usize,
}
