// src/models/dialog.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::schedule::TimeOfDay;

/// Passo atual da conversa de um usuário com a camada de chat. Cada passo
/// carrega só os dados que já foram coletados até ali.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum DialogState {
    #[default]
    Idle,

    // Agenda recorrente: dias da semana, depois horários
    #[serde(rename_all = "camelCase")]
    RecurringWeekdays { subject_id: i64, weekdays: Vec<i32> },
    #[serde(rename_all = "camelCase")]
    RecurringTimes {
        subject_id: i64,
        weekdays: Vec<i32>,
        times: Vec<TimeOfDay>,
    },

    // Slots avulsos por algumas semanas
    #[serde(rename_all = "camelCase")]
    PeriodWeekday { subject_id: i64, weeks: u32 },
    #[serde(rename_all = "camelCase")]
    PeriodTime { subject_id: i64, weeks: u32, weekday: i32 },

    // Preenchimento de um dia de trabalho
    #[serde(rename_all = "camelCase")]
    WorkdayDay { subject_id: i64 },
    #[serde(rename_all = "camelCase")]
    WorkdayStart { subject_id: i64, weekday: i32 },
    #[serde(rename_all = "camelCase")]
    WorkdayEnd { subject_id: i64, weekday: i32, start_hour: u32 },

    #[serde(rename_all = "camelCase")]
    SingleSlot { subject_id: i64, date: NaiveDate },
}

impl DialogState {
    pub const fn name(&self) -> &'static str {
        match self {
            DialogState::Idle => "idle",
            DialogState::RecurringWeekdays { .. } => "recurringWeekdays",
            DialogState::RecurringTimes { .. } => "recurringTimes",
            DialogState::PeriodWeekday { .. } => "periodWeekday",
            DialogState::PeriodTime { .. } => "periodTime",
            DialogState::WorkdayDay { .. } => "workdayDay",
            DialogState::WorkdayStart { .. } => "workdayStart",
            DialogState::WorkdayEnd { .. } => "workdayEnd",
            DialogState::SingleSlot { .. } => "singleSlot",
        }
    }

    const fn subject_id(&self) -> Option<i64> {
        match self {
            DialogState::Idle => None,
            DialogState::RecurringWeekdays { subject_id, .. }
            | DialogState::RecurringTimes { subject_id, .. }
            | DialogState::PeriodWeekday { subject_id, .. }
            | DialogState::PeriodTime { subject_id, .. }
            | DialogState::WorkdayDay { subject_id }
            | DialogState::WorkdayStart { subject_id, .. }
            | DialogState::WorkdayEnd { subject_id, .. }
            | DialogState::SingleSlot { subject_id, .. } => Some(*subject_id),
        }
    }

    /// Primeiro passo de um fluxo: só pode começar a partir de `Idle`.
    const fn is_entry(&self) -> bool {
        matches!(
            self,
            DialogState::RecurringWeekdays { .. }
                | DialogState::PeriodWeekday { .. }
                | DialogState::WorkdayDay { .. }
                | DialogState::SingleSlot { .. }
        )
    }

    /// Tabela de transições do diálogo.
    ///
    /// Voltar a `Idle` é sempre permitido; um fluxo só avança dentro da mesma
    /// disciplina e repetir o passo atual atualiza seus dados.
    pub fn can_move_to(&self, next: &DialogState) -> bool {
        if matches!(next, DialogState::Idle) {
            return true;
        }
        if matches!(self, DialogState::Idle) {
            return next.is_entry();
        }
        if self.subject_id() != next.subject_id() {
            return false;
        }

        matches!(
            (self, next),
            (DialogState::RecurringWeekdays { .. }, DialogState::RecurringWeekdays { .. })
                | (DialogState::RecurringWeekdays { .. }, DialogState::RecurringTimes { .. })
                | (DialogState::RecurringTimes { .. }, DialogState::RecurringTimes { .. })
                | (DialogState::PeriodWeekday { .. }, DialogState::PeriodWeekday { .. })
                | (DialogState::PeriodWeekday { .. }, DialogState::PeriodTime { .. })
                | (DialogState::WorkdayDay { .. }, DialogState::WorkdayStart { .. })
                | (DialogState::WorkdayStart { .. }, DialogState::WorkdayEnd { .. })
                | (DialogState::SingleSlot { .. }, DialogState::SingleSlot { .. })
        )
    }
}
