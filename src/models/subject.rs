// src/models/subject.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// A disciplina é gerida fora deste serviço; aqui só é lida.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[schema(example = 3)]
    pub id: i64,
    pub teacher_id: i64,
    #[schema(example = "Matemática")]
    pub name: String,
    #[schema(example = 60)]
    pub duration_minutes: i32,
    pub is_active: bool,
    pub requires_booking_approval: bool,
}
