// src/services/dialog.rs

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    common::error::{AppError, ConflictReason},
    models::dialog::DialogState,
};

/// Estado de diálogo por usuário. Vive só em memória, com trava por entrada,
/// e não participa das transações de agenda.
#[derive(Clone, Default)]
pub struct DialogStore {
    states: Arc<DashMap<i64, DialogState>>,
}

impl DialogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Usuário sem conversa em andamento está em `Idle`.
    pub fn get(&self, user_id: i64) -> DialogState {
        self.states
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Avança o diálogo conforme a tabela de transições. A leitura do passo
    /// atual e a escrita do próximo acontecem sob a mesma trava da entrada.
    pub fn advance(&self, user_id: i64, next: DialogState) -> Result<DialogState, AppError> {
        if matches!(next, DialogState::Idle) {
            self.clear(user_id);
            return Ok(next);
        }

        // Usuário sem entrada está em `Idle`; a entrada só é criada se o passo for aceito.
        match self.states.entry(user_id) {
            Entry::Occupied(mut entry) => {
                check_step(entry.get(), &next)?;
                tracing::debug!(user_id, from = entry.get().name(), to = next.name(), "diálogo avançou");
                entry.insert(next.clone());
            }
            Entry::Vacant(entry) => {
                check_step(&DialogState::Idle, &next)?;
                tracing::debug!(user_id, to = next.name(), "diálogo iniciado");
                entry.insert(next.clone());
            }
        }
        Ok(next)
    }

    pub fn clear(&self, user_id: i64) {
        self.states.remove(&user_id);
    }
}

fn check_step(current: &DialogState, next: &DialogState) -> Result<(), AppError> {
    if current.can_move_to(next) {
        Ok(())
    } else {
        Err(ConflictReason::InvalidDialogStep {
            from: current.name(),
            to: next.name(),
        }
        .into())
    }
}
