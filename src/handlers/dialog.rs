// src/handlers/dialog.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{common::error::AppError, config::AppState, middleware::actor::Actor, models::dialog::DialogState};

// GET /api/dialog
#[utoipa::path(
    get,
    path = "/api/dialog",
    tag = "Dialog",
    responses((status = 200, description = "Passo atual do diálogo", body = DialogState)),
    security(("user_id" = []))
)]
pub async fn get_dialog(State(app_state): State<AppState>, Actor(user_id): Actor) -> impl IntoResponse {
    Json(app_state.dialogs.get(user_id))
}

// PUT /api/dialog
#[utoipa::path(
    put,
    path = "/api/dialog",
    tag = "Dialog",
    request_body = DialogState,
    responses(
        (status = 200, description = "Diálogo avançou", body = DialogState),
        (status = 409, description = "Passo não permitido a partir do atual")
    ),
    security(("user_id" = []))
)]
pub async fn put_dialog(
    State(app_state): State<AppState>,
    Actor(user_id): Actor,
    Json(next): Json<DialogState>,
) -> Result<impl IntoResponse, AppError> {
    let state = app_state.dialogs.advance(user_id, next)?;
    Ok(Json(state))
}

// DELETE /api/dialog
#[utoipa::path(
    delete,
    path = "/api/dialog",
    tag = "Dialog",
    responses((status = 204, description = "Diálogo encerrado")),
    security(("user_id" = []))
)]
pub async fn clear_dialog(State(app_state): State<AppState>, Actor(user_id): Actor) -> impl IntoResponse {
    app_state.dialogs.clear(user_id);
    StatusCode::NO_CONTENT
}
