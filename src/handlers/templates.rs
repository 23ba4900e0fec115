// src/handlers/templates.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::actor::Actor,
    models::schedule::{RecurringTemplate, TemplateGroup, TimeOfDay},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplatesPayload {
    #[schema(example = 3)]
    pub subject_id: i64,

    /// 0 = domingo .. 6 = sábado
    #[validate(length(min = 1, max = 7, message = "Informe de 1 a 7 dias da semana"))]
    #[schema(example = json!([1, 3]))]
    pub weekdays: Vec<i32>,

    #[validate(length(min = 1, max = 24, message = "Informe de 1 a 24 horários"))]
    pub times: Vec<TimeOfDay>,

    /// Sem valor, usa a duração da disciplina.
    #[validate(range(min = 1, max = 1440, message = "Duração entre 1 e 1440 minutos"))]
    #[schema(example = 60)]
    pub duration_minutes: Option<i32>,

    /// Nome IANA; sem valor, usa o fuso padrão do serviço.
    #[schema(example = "Europe/Lisbon")]
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplatePayload {
    #[schema(example = 3)]
    pub subject_id: i64,

    #[validate(range(min = 0, max = 6, message = "Dia da semana entre 0 e 6"))]
    #[schema(example = 1)]
    pub weekday: i32,

    pub start: TimeOfDay,

    #[validate(range(min = 1, max = 1440, message = "Duração entre 1 e 1440 minutos"))]
    pub duration_minutes: Option<i32>,

    pub timezone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AffectedResponse {
    #[schema(example = 2)]
    pub affected: u64,
}

// POST /api/templates
#[utoipa::path(
    post,
    path = "/api/templates",
    tag = "Templates",
    request_body = CreateTemplatesPayload,
    responses(
        (status = 201, description = "Modelos criados e primeiras semanas geradas", body = TemplateGroup),
        (status = 403, description = "A disciplina é de outro professor"),
        (status = 422, description = "Dia, horário ou duração fora do intervalo")
    ),
    security(("user_id" = []))
)]
pub async fn create_templates(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Json(payload): Json<CreateTemplatesPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let group = app_state
        .schedule_service
        .create_template_group(
            teacher_id,
            payload.subject_id,
            &payload.weekdays,
            &payload.times,
            payload.duration_minutes,
            payload.timezone.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(group)))
}

// POST /api/templates/single
#[utoipa::path(
    post,
    path = "/api/templates/single",
    tag = "Templates",
    request_body = CreateTemplatePayload,
    responses(
        (status = 201, description = "Modelo criado num grupo próprio", body = RecurringTemplate),
        (status = 403, description = "A disciplina é de outro professor"),
        (status = 422, description = "Horário ou duração fora do intervalo")
    ),
    security(("user_id" = []))
)]
pub async fn create_template(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Json(payload): Json<CreateTemplatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let template = app_state
        .schedule_service
        .create_template(
            teacher_id,
            payload.subject_id,
            payload.weekday,
            payload.start,
            payload.duration_minutes,
            payload.timezone.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(template)))
}

// GET /api/templates
#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Templates",
    responses(
        (status = 200, description = "Modelos do professor", body = Vec<RecurringTemplate>)
    ),
    security(("user_id" = []))
)]
pub async fn list_templates(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
) -> Result<impl IntoResponse, AppError> {
    let templates = app_state.schedule_service.list_templates(teacher_id).await?;
    Ok(Json(templates))
}

// GET /api/templates/groups/{group_id}
#[utoipa::path(
    get,
    path = "/api/templates/groups/{group_id}",
    tag = "Templates",
    params(("group_id" = Uuid, Path, description = "ID do grupo")),
    responses(
        (status = 200, description = "Modelos do grupo", body = Vec<RecurringTemplate>),
        (status = 404, description = "Grupo não encontrado")
    ),
    security(("user_id" = []))
)]
pub async fn list_group(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let templates = app_state.schedule_service.list_group(teacher_id, group_id).await?;
    Ok(Json(templates))
}

// POST /api/templates/{id}/deactivate
#[utoipa::path(
    post,
    path = "/api/templates/{id}/deactivate",
    tag = "Templates",
    params(("id" = i64, Path, description = "ID do modelo")),
    responses(
        (status = 200, description = "Modelo desativado; slots existentes permanecem", body = AffectedResponse),
        (status = 404, description = "Modelo não encontrado")
    ),
    security(("user_id" = []))
)]
pub async fn deactivate_template(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let affected = app_state.schedule_service.deactivate_template(teacher_id, id).await?;
    Ok(Json(AffectedResponse { affected }))
}

// DELETE /api/templates/{id}
#[utoipa::path(
    delete,
    path = "/api/templates/{id}",
    tag = "Templates",
    params(("id" = i64, Path, description = "ID do modelo")),
    responses(
        (status = 200, description = "Modelo removido; slots perdem a referência", body = AffectedResponse),
        (status = 404, description = "Modelo não encontrado")
    ),
    security(("user_id" = []))
)]
pub async fn delete_template(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let affected = app_state.schedule_service.delete_template(teacher_id, id).await?;
    Ok(Json(AffectedResponse { affected }))
}

// POST /api/templates/groups/{group_id}/deactivate
#[utoipa::path(
    post,
    path = "/api/templates/groups/{group_id}/deactivate",
    tag = "Templates",
    params(("group_id" = Uuid, Path, description = "ID do grupo")),
    responses(
        (status = 200, description = "Grupo desativado", body = AffectedResponse),
        (status = 404, description = "Grupo não encontrado")
    ),
    security(("user_id" = []))
)]
pub async fn deactivate_group(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let affected = app_state.schedule_service.deactivate_group(teacher_id, group_id).await?;
    Ok(Json(AffectedResponse { affected }))
}

// DELETE /api/templates/groups/{group_id}
#[utoipa::path(
    delete,
    path = "/api/templates/groups/{group_id}",
    tag = "Templates",
    params(("group_id" = Uuid, Path, description = "ID do grupo")),
    responses(
        (status = 200, description = "Grupo removido", body = AffectedResponse),
        (status = 404, description = "Grupo não encontrado")
    ),
    security(("user_id" = []))
)]
pub async fn delete_group(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let affected = app_state.schedule_service.delete_group(teacher_id, group_id).await?;
    Ok(Json(AffectedResponse { affected }))
}
