// src/services/materializer.rs

use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::{
    common::{
        clock::Clock,
        error::{AppError, ConflictReason},
    },
    db::store::{SlotStore, TemplateStore},
    models::{
        events::DomainEvent,
        schedule::{NewSlot, RecurringTemplate},
    },
    services::events::EventBus,
};

// =============================================================================
//  CÁLCULO DE HORÁRIOS
// =============================================================================

pub fn parse_timezone(name: &str) -> Result<Tz, AppError> {
    name.parse::<Tz>()
        .map_err(|_| AppError::BadRequest(format!("Fuso horário desconhecido: '{name}'")))
}

/// `date@hour:minute` no fuso `tz`, em UTC.
///
/// Horário inexistente (salto do horário de verão) dá `None`; horário
/// ambíguo (recuo) fica com o primeiro instante.
pub fn local_instant(tz: Tz, date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Datas locais em `[hoje, hoje + weeks*7)` que caem no dia da semana pedido
/// (0 = domingo).
pub fn matching_dates(tz: Tz, now: DateTime<Utc>, weekday: u32, weeks: u32) -> Vec<NaiveDate> {
    let today = now.with_timezone(&tz).date_naive();
    (0..u64::from(weeks) * 7)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter(|date| date.weekday().num_days_from_sunday() == weekday)
        .collect()
}

/// Ocorrências semanais futuras (`start >= now`) como pares (início, fim).
pub fn weekly_occurrences(
    tz: Tz,
    now: DateTime<Utc>,
    weekday: u32,
    hour: u32,
    minute: u32,
    duration_minutes: i64,
    weeks: u32,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut occurrences = Vec::new();
    for date in matching_dates(tz, now, weekday, weeks) {
        let Some(start) = local_instant(tz, date, hour, minute) else {
            tracing::warn!(%date, hour, minute, timezone = %tz, "horário inexistente no fuso (horário de verão), ignorado");
            continue;
        };
        // Slots no passado não são reserváveis
        if start < now {
            continue;
        }
        occurrences.push((start, start + Duration::minutes(duration_minutes)));
    }
    occurrences
}

// =============================================================================
//  MATERIALIZADOR
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub templates: usize,
    pub slots_created: usize,
    pub failed_templates: usize,
    /// Cancelado entre dois modelos (desligamento do processo).
    pub interrupted: bool,
}

#[derive(Clone)]
pub struct SlotMaterializer {
    templates: Arc<dyn TemplateStore>,
    slots: Arc<dyn SlotStore>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl SlotMaterializer {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        slots: Arc<dyn SlotStore>,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Self {
        Self { templates, slots, clock, events }
    }

    /// Expande um modelo em slots para as próximas `weeks_ahead` semanas.
    ///
    /// Idempotente: horários já existentes para o professor são pulados e a
    /// duplicata que escapar da checagem é absorvida pela chave única. Falhas
    /// de um slot isolado são logadas e não interrompem a janela.
    pub async fn materialize_window(&self, template: &RecurringTemplate, weeks_ahead: u32) -> Result<usize, AppError> {
        let tz = parse_timezone(&template.timezone)?;
        let now = self.clock.now();

        let occurrences = weekly_occurrences(
            tz,
            now,
            u32::try_from(template.weekday).unwrap_or(u32::MAX),
            u32::try_from(template.start_hour).unwrap_or(u32::MAX),
            u32::try_from(template.start_minute).unwrap_or(u32::MAX),
            i64::from(template.duration_minutes),
            weeks_ahead,
        );

        let mut created = 0;
        for (start_time, end_time) in occurrences {
            match self.slots.slot_exists(template.teacher_id, start_time).await {
                Ok(true) => {
                    tracing::debug!(template_id = template.id, %start_time, "slot já existe, pulando");
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(template_id = template.id, %start_time, error = %e, "falha ao checar slot existente");
                    continue;
                }
            }

            let new_slot = NewSlot {
                teacher_id: template.teacher_id,
                subject_id: template.subject_id,
                template_id: Some(template.id),
                start_time,
                end_time,
            };

            match self.slots.insert_slot(&new_slot).await {
                Ok(_) => created += 1,
                Err(AppError::Conflict(ConflictReason::DuplicateSlot)) => {
                    tracing::debug!(template_id = template.id, %start_time, "slot criado em paralelo, pulando");
                }
                Err(e) => {
                    tracing::warn!(template_id = template.id, %start_time, error = %e, "falha ao criar slot");
                }
            }
        }

        if created > 0 {
            self.events.publish(DomainEvent::SlotsMaterialized {
                template_id: template.id,
                teacher_id: template.teacher_id,
                count: created,
            });
        }

        Ok(created)
    }

    /// Materializa todos os modelos ativos. Cada modelo é isolado: um modelo
    /// com erro é contado e o lote segue. O cancelamento só é observado entre
    /// modelos.
    pub async fn generate_all_active(
        &self,
        weeks_ahead: u32,
        cancel: &CancellationToken,
    ) -> Result<GenerationSummary, AppError> {
        let templates = self.templates.list_active_templates().await?;

        let mut summary = GenerationSummary {
            templates: templates.len(),
            ..GenerationSummary::default()
        };

        for template in &templates {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                tracing::info!("geração de slots interrompida pelo desligamento");
                break;
            }

            match self.materialize_window(template, weeks_ahead).await {
                Ok(count) => summary.slots_created += count,
                Err(e) => {
                    summary.failed_templates += 1;
                    tracing::error!(template_id = template.id, error = %e, "falha ao gerar slots do modelo");
                }
            }
        }

        tracing::info!(
            templates = summary.templates,
            slots_created = summary.slots_created,
            failed_templates = summary.failed_templates,
            "✅ Geração de slots concluída"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::clock::FixedClock,
        db::{memory::MemoryStore, store::TemplateStore},
        models::schedule::{NewTemplate, SlotStatus, TemplateSelector},
    };
    use uuid::Uuid;

    const TEACHER: i64 = 10;
    const SUBJECT: i64 = 20;

    fn materializer_at(store: &Arc<MemoryStore>, now: &str) -> SlotMaterializer {
        SlotMaterializer::new(
            store.clone(),
            store.clone(),
            Arc::new(FixedClock::at(now)),
            EventBus::new(16),
        )
    }

    async fn monday_nine(store: &MemoryStore) -> RecurringTemplate {
        store
            .insert_template(&NewTemplate {
                group_id: Uuid::new_v4(),
                teacher_id: TEACHER,
                subject_id: SUBJECT,
                weekday: 1,
                start_hour: 9,
                start_minute: 0,
                duration_minutes: 60,
                timezone: "UTC".to_string(),
            })
            .await
            .expect("insert template")
    }

    async fn teacher_slots(store: &MemoryStore) -> Vec<crate::models::schedule::Slot> {
        let from = DateTime::<Utc>::MIN_UTC;
        let to = DateTime::<Utc>::MAX_UTC;
        store.list_teacher_slots(TEACHER, from, to).await.expect("list")
    }

    #[test]
    fn occurrences_start_today_and_skip_the_past() {
        let tz: Tz = "UTC".parse().unwrap();
        // Segunda-feira, 08:00
        let now = FixedClock::at("2025-06-02T08:00:00Z").now();
        let slots = weekly_occurrences(tz, now, 1, 9, 0, 60, 4);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].0.to_rfc3339(), "2025-06-02T09:00:00+00:00");
        assert_eq!(slots[0].1.to_rfc3339(), "2025-06-02T10:00:00+00:00");

        // Segunda-feira, 10:00: a ocorrência de hoje já passou
        let now = FixedClock::at("2025-06-02T10:00:00Z").now();
        assert_eq!(weekly_occurrences(tz, now, 1, 9, 0, 60, 4).len(), 3);
    }

    #[test]
    fn occurrences_use_the_template_timezone() {
        let tz: Tz = "Europe/Lisbon".parse().unwrap();
        // Verão em Lisboa: UTC+1
        let now = FixedClock::at("2025-06-01T00:00:00Z").now();
        let slots = weekly_occurrences(tz, now, 1, 9, 0, 60, 1);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].0.to_rfc3339(), "2025-06-02T08:00:00+00:00");
    }

    #[test]
    fn nonexistent_local_time_is_skipped() {
        let tz: Tz = "Europe/Lisbon".parse().unwrap();
        // 2025-03-30 (domingo): 01:00 -> 02:00, 01:30 não existe
        let now = FixedClock::at("2025-03-29T00:00:00Z").now();
        let slots = weekly_occurrences(tz, now, 0, 1, 30, 30, 2);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].0.to_rfc3339(), "2025-04-06T00:30:00+00:00");
    }

    #[tokio::test]
    async fn monday_template_yields_four_slots_and_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let template = monday_nine(&store).await;
        let materializer = materializer_at(&store, "2025-06-02T08:00:00Z");

        assert_eq!(materializer.materialize_window(&template, 4).await.unwrap(), 4);
        assert_eq!(materializer.materialize_window(&template, 4).await.unwrap(), 0);

        let slots = teacher_slots(&store).await;
        assert_eq!(slots.len(), 4);
        assert!(slots.iter().all(|s| s.status == SlotStatus::Free));
        assert!(slots.iter().all(|s| s.template_id == Some(template.id)));
    }

    #[tokio::test]
    async fn monday_template_after_nine_yields_three_slots() {
        let store = Arc::new(MemoryStore::new());
        let template = monday_nine(&store).await;
        let materializer = materializer_at(&store, "2025-06-02T09:30:00Z");

        assert_eq!(materializer.materialize_window(&template, 4).await.unwrap(), 3);
        let now = FixedClock::at("2025-06-02T09:30:00Z").now();
        assert!(teacher_slots(&store).await.iter().all(|s| s.start_time >= now));
    }

    #[tokio::test]
    async fn window_grows_as_time_passes() {
        let store = Arc::new(MemoryStore::new());
        let template = monday_nine(&store).await;

        materializer_at(&store, "2025-06-02T08:00:00Z")
            .materialize_window(&template, 4)
            .await
            .unwrap();
        // Uma semana depois só a quarta segunda-feira nova é criada
        let created = materializer_at(&store, "2025-06-09T08:00:00Z")
            .materialize_window(&template, 4)
            .await
            .unwrap();
        assert_eq!(created, 1);
        assert_eq!(teacher_slots(&store).await.len(), 5);
    }

    #[tokio::test]
    async fn bad_timezone_fails_only_its_template() {
        let store = Arc::new(MemoryStore::new());
        monday_nine(&store).await;
        store
            .insert_template(&NewTemplate {
                group_id: Uuid::new_v4(),
                teacher_id: TEACHER,
                subject_id: SUBJECT,
                weekday: 3,
                start_hour: 9,
                start_minute: 0,
                duration_minutes: 60,
                timezone: "Marte/Olympus".to_string(),
            })
            .await
            .unwrap();

        let summary = materializer_at(&store, "2025-06-02T08:00:00Z")
            .generate_all_active(4, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.templates, 2);
        assert_eq!(summary.failed_templates, 1);
        assert_eq!(summary.slots_created, 4);
        assert!(!summary.interrupted);
    }

    #[tokio::test]
    async fn cancellation_stops_between_templates() {
        let store = Arc::new(MemoryStore::new());
        monday_nine(&store).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = materializer_at(&store, "2025-06-02T08:00:00Z")
            .generate_all_active(4, &cancel)
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.slots_created, 0);
    }

    // Comportamento documentado: desativar não cancela slots já gerados.
    #[tokio::test]
    async fn deactivated_template_keeps_existing_slots_but_stops_generating() {
        let store = Arc::new(MemoryStore::new());
        let template = monday_nine(&store).await;
        materializer_at(&store, "2025-06-02T08:00:00Z")
            .generate_all_active(4, &CancellationToken::new())
            .await
            .unwrap();

        store.deactivate_templates(TemplateSelector::One(template.id)).await.unwrap();

        let summary = materializer_at(&store, "2025-06-30T08:00:00Z")
            .generate_all_active(4, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(summary.templates, 0);

        let slots = teacher_slots(&store).await;
        assert_eq!(slots.len(), 4);
        assert!(slots.iter().all(|s| s.status == SlotStatus::Free));
    }

    #[tokio::test]
    async fn materialization_publishes_an_event() {
        let store = Arc::new(MemoryStore::new());
        let template = monday_nine(&store).await;
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let materializer = SlotMaterializer::new(
            store.clone(),
            store.clone(),
            Arc::new(FixedClock::at("2025-06-02T08:00:00Z")),
            bus,
        );

        materializer.materialize_window(&template, 2).await.unwrap();

        match rx.try_recv() {
            Ok(DomainEvent::SlotsMaterialized { template_id, count, .. }) => {
                assert_eq!(template_id, template.id);
                assert_eq!(count, 2);
            }
            other => panic!("evento inesperado: {other:?}"),
        }
    }
}
