// src/routes.rs

use axum::{
    routing::{delete, get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

pub fn app_router(app_state: AppState) -> Router {
    let template_routes = Router::new()
        .route("/"
               ,post(handlers::templates::create_templates)
               .get(handlers::templates::list_templates)
        )
        .route("/single", post(handlers::templates::create_template))
        .route("/{id}", delete(handlers::templates::delete_template))
        .route("/{id}/deactivate", post(handlers::templates::deactivate_template))
        .route("/groups/{group_id}"
               ,get(handlers::templates::list_group)
               .delete(handlers::templates::delete_group)
        )
        .route("/groups/{group_id}/deactivate", post(handlers::templates::deactivate_group));

    let slot_routes = Router::new()
        .route("/", post(handlers::slots::create_slot))
        .route("/period", post(handlers::slots::create_period_slots))
        .route("/workday", post(handlers::slots::create_workday_slots))
        .route("/{id}/withdraw", post(handlers::slots::withdraw_slot))
        .route("/{id}/reserve", post(handlers::slots::reserve_slot))
        .route("/{id}/cancel-booking", post(handlers::slots::cancel_slot_booking));

    let booking_routes = Router::new()
        .route("/pending", get(handlers::bookings::pending_bookings))
        .route("/mine", get(handlers::bookings::my_bookings))
        .route("/teaching", get(handlers::bookings::teaching_bookings))
        .route("/{id}/approve", post(handlers::bookings::approve_booking))
        .route("/{id}/reject", post(handlers::bookings::reject_booking))
        .route("/{id}/cancel", post(handlers::bookings::cancel_booking));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/subjects/{id}/slots", get(handlers::slots::available_slots))
        .route("/api/schedule", get(handlers::slots::teacher_schedule))
        .route("/api/materialize", post(handlers::admin::materialize_now))
        .route("/api/dialog"
               ,get(handlers::dialog::get_dialog)
               .put(handlers::dialog::put_dialog)
               .delete(handlers::dialog::clear_dialog)
        )
        .nest("/api/templates", template_routes)
        .nest("/api/slots", slot_routes)
        .nest("/api/bookings", booking_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        common::clock::FixedClock,
        config::Config,
        db::MemoryStore,
        models::subject::Subject,
    };

    const TEACHER: i64 = 10;
    const STUDENT: i64 = 30;
    const SUBJECT: i64 = 20;

    async fn test_app(requires_booking_approval: bool) -> Router {
        let store = Arc::new(MemoryStore::new());
        store
            .put_subject(Subject {
                id: SUBJECT,
                teacher_id: TEACHER,
                name: "Piano".to_string(),
                duration_minutes: 60,
                is_active: true,
                requires_booking_approval,
            })
            .await;

        let clock = Arc::new(FixedClock::at("2025-06-02T08:00:00Z"));
        app_router(AppState::in_memory(&Config::for_tests(), store, clock))
    }

    async fn send(app: &Router, method: &str, uri: &str, user: Option<i64>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user {
            request = request.header("x-user-id", user_id.to_string());
        }
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_check() {
        let app = test_app(false).await;
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_user_header_is_a_bad_request() {
        let app = test_app(false).await;
        let (status, body) = send(&app, "GET", "/api/templates", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("x-user-id"));
    }

    #[tokio::test]
    async fn template_to_booking_round_trip() {
        let app = test_app(true).await;

        let (status, group) = send(
            &app,
            "POST",
            "/api/templates",
            Some(TEACHER),
            Some(json!({ "subjectId": SUBJECT, "weekdays": [1], "times": [{ "hour": 9, "minute": 0 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(group["seededSlots"], 4);

        let (status, slots) = send(
            &app,
            "GET",
            &format!("/api/subjects/{SUBJECT}/slots?from=2025-06-01T00:00:00Z&to=2025-07-01T00:00:00Z"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let slot_id = slots[0]["id"].as_i64().unwrap();
        assert_eq!(slots[0]["status"], "free");

        let (status, booking) = send(&app, "POST", &format!("/api/slots/{slot_id}/reserve"), Some(STUDENT), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(booking["status"], "pending");
        let booking_id = booking["id"].as_i64().unwrap();

        let (status, _) = send(&app, "POST", &format!("/api/slots/{slot_id}/reserve"), Some(STUDENT + 1), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, pending) = send(&app, "GET", "/api/bookings/pending", Some(TEACHER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "POST", &format!("/api/bookings/{booking_id}/approve"), Some(STUDENT), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, approved) = send(&app, "POST", &format!("/api/bookings/{booking_id}/approve"), Some(TEACHER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["status"], "confirmed");

        let (status, _) = send(&app, "POST", &format!("/api/bookings/{booking_id}/cancel"), Some(STUDENT), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", &format!("/api/bookings/{booking_id}/cancel"), Some(STUDENT), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].is_string());

        let (_, mine) = send(&app, "GET", "/api/bookings/mine", Some(STUDENT), None).await;
        assert_eq!(mine[0]["status"], "canceled");
    }

    #[tokio::test]
    async fn single_template_gets_its_own_group() {
        let app = test_app(false).await;
        let (status, template) = send(
            &app,
            "POST",
            "/api/templates/single",
            Some(TEACHER),
            Some(json!({ "subjectId": SUBJECT, "weekday": 5, "start": { "hour": 18, "minute": 0 } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(template["weekday"], 5);
        assert_eq!(template["durationMinutes"], 60);

        let group_id = template["groupId"].as_str().unwrap();
        let (status, group) = send(&app, "GET", &format!("/api/templates/groups/{group_id}"), Some(TEACHER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(group.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "GET", &format!("/api/templates/groups/{group_id}"), Some(STUDENT), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn invalid_payload_reports_field_details() {
        let app = test_app(false).await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/templates",
            Some(TEACHER),
            Some(json!({ "subjectId": SUBJECT, "weekdays": [], "times": [{ "hour": 9, "minute": 0 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["weekdays"].is_array());
    }

    #[tokio::test]
    async fn past_ad_hoc_slot_is_unprocessable() {
        let app = test_app(false).await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/slots",
            Some(TEACHER),
            Some(json!({
                "subjectId": SUBJECT,
                "startTime": "2025-06-01T10:00:00Z",
                "endTime": "2025-06-01T11:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn workday_and_withdraw_over_http() {
        let app = test_app(false).await;

        let (status, report) = send(
            &app,
            "POST",
            "/api/slots/workday",
            Some(TEACHER),
            Some(json!({ "subjectId": SUBJECT, "weekday": 2, "startHour": 9, "endHour": 12 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(report, json!({ "created": 3, "attempted": 3 }));

        let (_, schedule) = send(
            &app,
            "GET",
            "/api/schedule?from=2025-06-01T00:00:00Z&to=2025-06-08T00:00:00Z",
            Some(TEACHER),
            None,
        )
        .await;
        let slot_id = schedule[0]["id"].as_i64().unwrap();

        let (status, slot) = send(&app, "POST", &format!("/api/slots/{slot_id}/withdraw"), Some(TEACHER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(slot["status"], "canceled");

        let (status, _) = send(&app, "POST", &format!("/api/slots/{slot_id}/withdraw"), Some(TEACHER), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn materialize_endpoint_is_idempotent() {
        let app = test_app(false).await;
        send(
            &app,
            "POST",
            "/api/templates",
            Some(TEACHER),
            Some(json!({ "subjectId": SUBJECT, "weekdays": [3], "times": [{ "hour": 14, "minute": 30 }] })),
        )
        .await;

        let (status, _) = send(&app, "POST", "/api/materialize", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, summary) = send(&app, "POST", "/api/materialize", Some(TEACHER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["templates"], 1);
        assert_eq!(summary["slotsCreated"], 0);
        assert_eq!(summary["interrupted"], false);
    }

    #[tokio::test]
    async fn dialog_state_per_user() {
        let app = test_app(false).await;

        let (_, state) = send(&app, "GET", "/api/dialog", Some(TEACHER), None).await;
        assert_eq!(state["step"], "idle");

        let (status, state) = send(
            &app,
            "PUT",
            "/api/dialog",
            Some(TEACHER),
            Some(json!({ "step": "workdayDay", "subjectId": SUBJECT })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state["step"], "workdayDay");

        let (status, _) = send(
            &app,
            "PUT",
            "/api/dialog",
            Some(TEACHER),
            Some(json!({ "step": "periodTime", "subjectId": SUBJECT, "weeks": 2, "weekday": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, other) = send(&app, "GET", "/api/dialog", Some(STUDENT), None).await;
        assert_eq!(other["step"], "idle");

        let (status, _) = send(&app, "DELETE", "/api/dialog", Some(TEACHER), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, state) = send(&app, "GET", "/api/dialog", Some(TEACHER), None).await;
        assert_eq!(state["step"], "idle");
    }
}
