// src/handlers/bookings.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::{common::error::AppError, config::AppState, middleware::actor::Actor, models::booking::Booking};

// POST /api/bookings/{id}/approve
#[utoipa::path(
    post,
    path = "/api/bookings/{id}/approve",
    tag = "Bookings",
    params(("id" = i64, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva confirmada", body = Booking),
        (status = 403, description = "Reserva de outro professor"),
        (status = 409, description = "Reserva não está pendente")
    ),
    security(("user_id" = []))
)]
pub async fn approve_booking(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = app_state.booking_service.approve(teacher_id, id).await?;
    Ok(Json(booking))
}

// POST /api/bookings/{id}/reject
#[utoipa::path(
    post,
    path = "/api/bookings/{id}/reject",
    tag = "Bookings",
    params(("id" = i64, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva recusada e slot liberado", body = Booking),
        (status = 409, description = "Reserva não está pendente")
    ),
    security(("user_id" = []))
)]
pub async fn reject_booking(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = app_state.booking_service.reject(teacher_id, id).await?;
    Ok(Json(booking))
}

// POST /api/bookings/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/bookings/{id}/cancel",
    tag = "Bookings",
    params(("id" = i64, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva cancelada e slot liberado", body = Booking),
        (status = 403, description = "Quem chama não é o aluno nem o professor"),
        (status = 409, description = "Reserva já encerrada")
    ),
    security(("user_id" = []))
)]
pub async fn cancel_booking(
    State(app_state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = app_state.booking_service.cancel(actor_id, id).await?;
    Ok(Json(booking))
}

// GET /api/bookings/pending
#[utoipa::path(
    get,
    path = "/api/bookings/pending",
    tag = "Bookings",
    responses((status = 200, description = "Reservas aguardando aprovação", body = Vec<Booking>)),
    security(("user_id" = []))
)]
pub async fn pending_bookings(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
) -> Result<impl IntoResponse, AppError> {
    let bookings = app_state.booking_service.get_pending_bookings(teacher_id).await?;
    Ok(Json(bookings))
}

// GET /api/bookings/mine
#[utoipa::path(
    get,
    path = "/api/bookings/mine",
    tag = "Bookings",
    responses((status = 200, description = "Reservas do aluno, mais recentes primeiro", body = Vec<Booking>)),
    security(("user_id" = []))
)]
pub async fn my_bookings(
    State(app_state): State<AppState>,
    Actor(student_id): Actor,
) -> Result<impl IntoResponse, AppError> {
    let bookings = app_state.booking_service.get_student_bookings(student_id).await?;
    Ok(Json(bookings))
}

// GET /api/bookings/teaching
#[utoipa::path(
    get,
    path = "/api/bookings/teaching",
    tag = "Bookings",
    responses((status = 200, description = "Reservas nos slots do professor", body = Vec<Booking>)),
    security(("user_id" = []))
)]
pub async fn teaching_bookings(
    State(app_state): State<AppState>,
    Actor(teacher_id): Actor,
) -> Result<impl IntoResponse, AppError> {
    let bookings = app_state.booking_service.get_teacher_bookings(teacher_id).await?;
    Ok(Json(bookings))
}
