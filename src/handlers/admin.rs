// src/handlers/admin.rs

use axum::{extract::State, response::IntoResponse, Json};
use tokio_util::sync::CancellationToken;

use crate::{
    common::error::AppError, config::AppState, middleware::actor::Actor,
    services::materializer::GenerationSummary,
};

// POST /api/materialize
#[utoipa::path(
    post,
    path = "/api/materialize",
    tag = "Admin",
    responses(
        (status = 200, description = "Geração avulsa de slots para todos os modelos ativos", body = GenerationSummary),
        (status = 400, description = "Cabeçalho x-user-id ausente")
    ),
    security(("user_id" = []))
)]
pub async fn materialize_now(
    State(app_state): State<AppState>,
    Actor(user_id): Actor,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(user_id, "Geração avulsa solicitada");
    // Execução avulsa: roda até o fim, sem ligação com o desligamento do processo
    let summary = app_state
        .materializer
        .generate_all_active(app_state.generation_weeks_ahead, &CancellationToken::new())
        .await?;
    Ok(Json(summary))
}
