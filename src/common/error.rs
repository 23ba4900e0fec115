use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::{
    booking::{BookingAction, BookingStatus},
    schedule::{SlotAction, SlotStatus},
};

/// Entidades que podem não existir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Template,
    TemplateGroup,
    Slot,
    Booking,
    Subject,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Template => "Modelo recorrente",
            Entity::TemplateGroup => "Grupo de modelos",
            Entity::Slot => "Slot",
            Entity::Booking => "Reserva",
            Entity::Subject => "Disciplina",
        };
        f.write_str(name)
    }
}

/// Motivos de conflito com o estado atual.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictReason {
    #[error("O slot não está mais disponível")]
    SlotUnavailable,

    #[error("Já existe um slot deste professor neste horário")]
    DuplicateSlot,

    #[error("A reserva está '{from}' e não aceita '{action}'")]
    InvalidBookingTransition { from: BookingStatus, action: BookingAction },

    #[error("O slot está '{from}' e não aceita '{action}'")]
    InvalidSlotTransition { from: SlotStatus, action: SlotAction },

    #[error("O diálogo está em '{from}' e não pode ir para '{to}'")]
    InvalidDialogStep { from: &'static str, to: &'static str },

    // A linha mudou entre a leitura e a escrita condicional.
    #[error("O registro foi alterado por outra operação")]
    StaleState,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0} não encontrado(a)")]
    NotFound(Entity),

    #[error("{0}")]
    Conflict(ConflictReason),

    #[error("Sem permissão para alterar este recurso")]
    Forbidden,

    #[error("{0}")]
    InvalidTime(String),

    #[error("A disciplina está inativa")]
    InactiveSubject,

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<ConflictReason> for AppError {
    fn from(reason: ConflictReason) -> Self {
        AppError::Conflict(reason)
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InvalidTime(_) | AppError::InactiveSubject => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }

            // O `tracing` loga a mensagem detalhada; o cliente recebe uma genérica.
            ref e @ (AppError::DatabaseError(_) | AppError::InternalServerError(_)) => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                "Ocorreu um erro inesperado.".to_string()
            }

            e => e.to_string(),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
