// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Templates ---
        handlers::templates::create_templates,
        handlers::templates::create_template,
        handlers::templates::list_templates,
        handlers::templates::list_group,
        handlers::templates::deactivate_template,
        handlers::templates::delete_template,
        handlers::templates::deactivate_group,
        handlers::templates::delete_group,

        // --- Slots ---
        handlers::slots::create_slot,
        handlers::slots::create_period_slots,
        handlers::slots::create_workday_slots,
        handlers::slots::withdraw_slot,
        handlers::slots::available_slots,
        handlers::slots::teacher_schedule,

        // --- Bookings ---
        handlers::slots::reserve_slot,
        handlers::slots::cancel_slot_booking,
        handlers::bookings::approve_booking,
        handlers::bookings::reject_booking,
        handlers::bookings::cancel_booking,
        handlers::bookings::pending_bookings,
        handlers::bookings::my_bookings,
        handlers::bookings::teaching_bookings,

        // --- Dialog ---
        handlers::dialog::get_dialog,
        handlers::dialog::put_dialog,
        handlers::dialog::clear_dialog,

        // --- Admin ---
        handlers::admin::materialize_now,
    ),
    components(
        schemas(
            // --- Agenda ---
            models::schedule::SlotStatus,
            models::schedule::RecurringTemplate,
            models::schedule::TimeOfDay,
            models::schedule::TemplateGroup,
            models::schedule::Slot,
            models::schedule::CreationReport,
            models::subject::Subject,

            // --- Reservas ---
            models::booking::BookingStatus,
            models::booking::Booking,

            // --- Diálogo ---
            models::dialog::DialogState,

            // --- Geração ---
            services::materializer::GenerationSummary,

            // --- Payloads ---
            handlers::templates::CreateTemplatesPayload,
            handlers::templates::CreateTemplatePayload,
            handlers::templates::AffectedResponse,
            handlers::slots::CreateSlotPayload,
            handlers::slots::PeriodSlotsPayload,
            handlers::slots::WorkdaySlotsPayload,
        )
    ),
    tags(
        (name = "Templates", description = "Modelos recorrentes de disponibilidade"),
        (name = "Slots", description = "Slots materializados e avulsos"),
        (name = "Bookings", description = "Reservas e aprovação"),
        (name = "Dialog", description = "Estado de conversa por usuário"),
        (name = "Admin", description = "Operações administrativas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "user_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-user-id"))),
        );
    }
}
