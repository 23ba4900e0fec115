// src/handlers/slots.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::actor::Actor,
    models::{
        booking::Booking,
        schedule::{CreationReport, Slot, TimeOfDay},
    },
};

// =============================================================================
//  1. CRIAÇÃO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotPayload {
    #[schema(example = 3)]
    pub subject_id: i64,
    #[schema(example = "2025-06-03T10:00:00Z")]
    pub start_time: DateTime<Utc>,
    #[schema(example = "2025-06-03T11:00:00Z")]
    pub end_time: DateTime<Utc>,
}

// POST /api/slots
#[utoipa::path(
    post,
    path = "/api/slots",
    tag = "Slots",
    request_body = CreateSlotPayload,
    responses(
        (status = 201, description = "Slot avulso criado", body = Slot),
        (status = 409, description = "Já existe slot neste horário"),
        (status = 422, description = "Intervalo inválido ou no passado")
    ),
    security(("user_id" = []))
)]
pub async fn create_slot(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Json(payload): Json<CreateSlotPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let slot = app_state
        .schedule_service
        .create_slot(teacher_id, payload.subject_id, payload.start_time, payload.end_time)
        .await?;

    Ok((StatusCode::CREATED, Json(slot)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSlotsPayload {
    #[schema(example = 3)]
    pub subject_id: i64,

    #[validate(range(min = 0, max = 6, message = "0 = domingo .. 6 = sábado"))]
    #[schema(example = 2)]
    pub weekday: i32,

    pub start: TimeOfDay,

    #[validate(range(min = 1, max = 52, message = "Entre 1 e 52 semanas"))]
    #[schema(example = 4)]
    pub weeks: Option<u32>,
}

// POST /api/slots/period
#[utoipa::path(
    post,
    path = "/api/slots/period",
    tag = "Slots",
    request_body = PeriodSlotsPayload,
    responses(
        (status = 201, description = "N de M slots criados", body = CreationReport)
    ),
    security(("user_id" = []))
)]
pub async fn create_period_slots(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Json(payload): Json<PeriodSlotsPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let report = app_state
        .schedule_service
        .create_slots_for_period(teacher_id, payload.subject_id, payload.weekday, payload.start, payload.weeks)
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkdaySlotsPayload {
    #[schema(example = 3)]
    pub subject_id: i64,

    #[validate(range(min = 0, max = 6, message = "0 = domingo .. 6 = sábado"))]
    #[schema(example = 1)]
    pub weekday: i32,

    #[validate(range(max = 23, message = "Hora entre 0 e 23"))]
    #[schema(example = 9)]
    pub start_hour: Option<u32>,

    #[validate(range(min = 1, max = 24, message = "Hora entre 1 e 24"))]
    #[schema(example = 18)]
    pub end_hour: Option<u32>,
}

// POST /api/slots/workday
#[utoipa::path(
    post,
    path = "/api/slots/workday",
    tag = "Slots",
    request_body = WorkdaySlotsPayload,
    responses(
        (status = 201, description = "N de M slots criados", body = CreationReport)
    ),
    security(("user_id" = []))
)]
pub async fn create_workday_slots(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Json(payload): Json<WorkdaySlotsPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let report = app_state
        .schedule_service
        .create_workday_slots(teacher_id, payload.subject_id, payload.weekday, payload.start_hour, payload.end_hour)
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

// =============================================================================
//  2. CICLO DE VIDA DO SLOT
// =============================================================================

// POST /api/slots/{id}/withdraw
#[utoipa::path(
    post,
    path = "/api/slots/{id}/withdraw",
    tag = "Slots",
    params(("id" = i64, Path, description = "ID do slot")),
    responses(
        (status = 200, description = "Slot retirado (reserva ativa cancelada junto)", body = Slot),
        (status = 409, description = "Slot já retirado")
    ),
    security(("user_id" = []))
)]
pub async fn withdraw_slot(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let slot = app_state.schedule_service.withdraw_slot(teacher_id, id).await?;
    Ok(Json(slot))
}

// POST /api/slots/{id}/reserve
#[utoipa::path(
    post,
    path = "/api/slots/{id}/reserve",
    tag = "Bookings",
    params(("id" = i64, Path, description = "ID do slot")),
    responses(
        (status = 201, description = "Reserva criada (pending ou confirmed)", body = Booking),
        (status = 409, description = "Slot indisponível"),
        (status = 422, description = "Slot no passado ou disciplina inativa")
    ),
    security(("user_id" = []))
)]
pub async fn reserve_slot(
    State(app_state): State<AppState>,
    Actor(student_id): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = app_state.booking_service.reserve(student_id, id).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// POST /api/slots/{id}/cancel-booking
#[utoipa::path(
    post,
    path = "/api/slots/{id}/cancel-booking",
    tag = "Bookings",
    params(("id" = i64, Path, description = "ID do slot")),
    responses(
        (status = 200, description = "Reserva ativa do slot cancelada", body = Booking),
        (status = 404, description = "Slot sem reserva ativa")
    ),
    security(("user_id" = []))
)]
pub async fn cancel_slot_booking(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = app_state.booking_service.cancel_by_slot(teacher_id, id).await?;
    Ok(Json(booking))
}

// =============================================================================
//  3. CONSULTAS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

// GET /api/subjects/{id}/slots
#[utoipa::path(
    get,
    path = "/api/subjects/{id}/slots",
    tag = "Slots",
    params(
        ("id" = i64, Path, description = "ID da disciplina"),
        ("from" = String, Query, description = "Início (RFC 3339)"),
        ("to" = String, Query, description = "Fim, exclusivo (RFC 3339)")
    ),
    responses(
        (status = 200, description = "Slots livres em ordem cronológica", body = Vec<Slot>)
    )
)]
pub async fn available_slots(
    State(app_state): State<AppState>,
    Path(subject_id): Path<i64>,
    Query(range): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let slots = app_state
        .schedule_service
        .get_available_slots(subject_id, range.from, range.to)
        .await?;
    Ok(Json(slots))
}

// GET /api/schedule
#[utoipa::path(
    get,
    path = "/api/schedule",
    tag = "Slots",
    params(
        ("from" = String, Query, description = "Início (RFC 3339)"),
        ("to" = String, Query, description = "Fim, exclusivo (RFC 3339)")
    ),
    responses(
        (status = 200, description = "Agenda do professor (todos os status)", body = Vec<Slot>)
    ),
    security(("user_id" = []))
)]
pub async fn teacher_schedule(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Query(range): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let slots = app_state
        .schedule_service
        .get_teacher_schedule(teacher_id, range.from, range.to)
        .await?;
    Ok(Json(slots))
}
