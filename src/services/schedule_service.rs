// src/services/schedule_service.rs

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Datelike, Days, Duration, Timelike, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::{
    common::{
        clock::Clock,
        error::{AppError, ConflictReason, Entity},
    },
    db::store::{BookingStore, SlotStore, SubjectLookup, TemplateStore},
    models::{
        events::DomainEvent,
        schedule::{
            CreationReport, NewSlot, NewTemplate, RecurringTemplate, Slot, SlotAction, TemplateGroup,
            TemplateSelector, TimeOfDay,
        },
        subject::Subject,
    },
    services::{
        events::EventBus,
        materializer::{self, SlotMaterializer},
    },
};

pub const DEFAULT_PERIOD_WEEKS: u32 = 4;
pub const DEFAULT_WORKDAY_START: u32 = 9;
pub const DEFAULT_WORKDAY_END: u32 = 18;

#[derive(Debug, Clone, Copy)]
pub struct ScheduleSettings {
    /// Fuso dos slots avulsos e dos modelos criados sem fuso explícito.
    pub default_timezone: Tz,
    /// Semanas materializadas logo após a criação de um modelo.
    pub seed_weeks_ahead: u32,
}

#[derive(Clone)]
pub struct ScheduleService {
    templates: Arc<dyn TemplateStore>,
    slots: Arc<dyn SlotStore>,
    bookings: Arc<dyn BookingStore>,
    subjects: Arc<dyn SubjectLookup>,
    materializer: SlotMaterializer,
    clock: Arc<dyn Clock>,
    events: EventBus,
    settings: ScheduleSettings,
}

fn validate_weekday(weekday: i32) -> Result<u32, AppError> {
    u32::try_from(weekday)
        .ok()
        .filter(|w| *w <= 6)
        .ok_or_else(|| AppError::InvalidTime(format!("Dia da semana inválido: {weekday} (0 = domingo .. 6 = sábado)")))
}

fn validate_time_of_day(time: TimeOfDay) -> Result<(u32, u32), AppError> {
    let hour = u32::try_from(time.hour).ok().filter(|h| *h <= 23);
    let minute = u32::try_from(time.minute).ok().filter(|m| *m <= 59);
    match (hour, minute) {
        (Some(h), Some(m)) => Ok((h, m)),
        _ => Err(AppError::InvalidTime(format!(
            "Horário inválido: {:02}:{:02}",
            time.hour, time.minute
        ))),
    }
}

fn validate_duration(duration_minutes: i32) -> Result<i32, AppError> {
    if duration_minutes <= 0 {
        return Err(AppError::InvalidTime("A duração deve ser maior que zero".to_string()));
    }
    Ok(duration_minutes)
}

fn dedup<T: Copy + Eq + std::hash::Hash>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    items.iter().copied().filter(|item| seen.insert(*item)).collect()
}

impl ScheduleService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        slots: Arc<dyn SlotStore>,
        bookings: Arc<dyn BookingStore>,
        subjects: Arc<dyn SubjectLookup>,
        materializer: SlotMaterializer,
        clock: Arc<dyn Clock>,
        events: EventBus,
        settings: ScheduleSettings,
    ) -> Self {
        Self {
            templates,
            slots,
            bookings,
            subjects,
            materializer,
            clock,
            events,
            settings,
        }
    }

    /// Disciplina que pertence ao professor.
    async fn owned_subject(&self, teacher_id: i64, subject_id: i64) -> Result<Subject, AppError> {
        let subject = self
            .subjects
            .find_subject(subject_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Subject))?;

        if subject.teacher_id != teacher_id {
            return Err(AppError::Forbidden);
        }
        Ok(subject)
    }

    async fn owned_template(&self, teacher_id: i64, template_id: i64) -> Result<RecurringTemplate, AppError> {
        let template = self
            .templates
            .find_template(template_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Template))?;

        if template.teacher_id != teacher_id {
            return Err(AppError::Forbidden);
        }
        Ok(template)
    }

    fn resolve_timezone(&self, timezone: Option<&str>) -> Result<Tz, AppError> {
        match timezone {
            Some(name) => materializer::parse_timezone(name),
            None => Ok(self.settings.default_timezone),
        }
    }

    /// Persiste o modelo e já materializa as primeiras semanas. Falha na
    /// semeadura não desfaz o modelo: a geração periódica tenta de novo.
    async fn insert_and_seed(&self, new: &NewTemplate) -> Result<(RecurringTemplate, usize), AppError> {
        let template = self.templates.insert_template(new).await?;

        let seeded = match self
            .materializer
            .materialize_window(&template, self.settings.seed_weeks_ahead)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(template_id = template.id, error = %e, "falha ao semear slots do modelo");
                0
            }
        };

        Ok((template, seeded))
    }

    // =========================================================================
    //  MODELOS RECORRENTES
    // =========================================================================

    /// Um único modelo, num grupo novo.
    pub async fn create_template(
        &self,
        teacher_id: i64,
        subject_id: i64,
        weekday: i32,
        start: TimeOfDay,
        duration_minutes: Option<i32>,
        timezone: Option<&str>,
    ) -> Result<RecurringTemplate, AppError> {
        let subject = self.owned_subject(teacher_id, subject_id).await?;
        validate_weekday(weekday)?;
        validate_time_of_day(start)?;
        let duration_minutes = validate_duration(duration_minutes.unwrap_or(subject.duration_minutes))?;
        let tz = self.resolve_timezone(timezone)?;

        let new = NewTemplate {
            group_id: Uuid::new_v4(),
            teacher_id,
            subject_id,
            weekday,
            start_hour: start.hour,
            start_minute: start.minute,
            duration_minutes,
            timezone: tz.name().to_string(),
        };

        let (template, seeded) = self.insert_and_seed(&new).await?;
        tracing::info!(template_id = template.id, teacher_id, seeded, "Modelo recorrente criado");
        Ok(template)
    }

    /// Um modelo por combinação (dia da semana × horário), todos no mesmo
    /// grupo. Entradas repetidas são ignoradas; um modelo que falhar ao ser
    /// gravado não impede os demais.
    pub async fn create_template_group(
        &self,
        teacher_id: i64,
        subject_id: i64,
        weekdays: &[i32],
        times: &[TimeOfDay],
        duration_minutes: Option<i32>,
        timezone: Option<&str>,
    ) -> Result<TemplateGroup, AppError> {
        let subject = self.owned_subject(teacher_id, subject_id).await?;

        let weekdays = dedup(weekdays);
        let times = dedup(times);
        if weekdays.is_empty() || times.is_empty() {
            return Err(AppError::BadRequest(
                "Informe ao menos um dia da semana e um horário".to_string(),
            ));
        }
        for weekday in &weekdays {
            validate_weekday(*weekday)?;
        }
        for time in &times {
            validate_time_of_day(*time)?;
        }
        let duration_minutes = validate_duration(duration_minutes.unwrap_or(subject.duration_minutes))?;
        let tz = self.resolve_timezone(timezone)?;

        let group_id = Uuid::new_v4();
        let mut templates = Vec::with_capacity(weekdays.len() * times.len());
        let mut seeded_slots = 0;

        for weekday in &weekdays {
            for time in &times {
                let new = NewTemplate {
                    group_id,
                    teacher_id,
                    subject_id,
                    weekday: *weekday,
                    start_hour: time.hour,
                    start_minute: time.minute,
                    duration_minutes,
                    timezone: tz.name().to_string(),
                };

                match self.insert_and_seed(&new).await {
                    Ok((template, seeded)) => {
                        seeded_slots += seeded;
                        templates.push(template);
                    }
                    Err(e) => {
                        tracing::error!(%group_id, weekday, hour = time.hour, minute = time.minute, error = %e, "falha ao criar modelo do grupo");
                    }
                }
            }
        }

        if templates.is_empty() {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "nenhum modelo do grupo {group_id} pôde ser criado"
            )));
        }

        tracing::info!(%group_id, teacher_id, templates = templates.len(), seeded_slots, "Grupo de modelos criado");
        Ok(TemplateGroup { group_id, templates, seeded_slots })
    }

    pub async fn list_templates(&self, teacher_id: i64) -> Result<Vec<RecurringTemplate>, AppError> {
        self.templates.list_templates_by_teacher(teacher_id).await
    }

    pub async fn list_group(&self, teacher_id: i64, group_id: Uuid) -> Result<Vec<RecurringTemplate>, AppError> {
        let templates = self.templates.list_templates_by_group(group_id).await?;
        if templates.is_empty() {
            return Err(AppError::NotFound(Entity::TemplateGroup));
        }
        if templates.iter().any(|t| t.teacher_id != teacher_id) {
            return Err(AppError::Forbidden);
        }
        Ok(templates)
    }

    /// Desativa o modelo. Os slots já gerados continuam como estão.
    pub async fn deactivate_template(&self, teacher_id: i64, template_id: i64) -> Result<u64, AppError> {
        self.owned_template(teacher_id, template_id).await?;
        let affected = self.templates.deactivate_templates(TemplateSelector::One(template_id)).await?;
        tracing::info!(template_id, teacher_id, "Modelo desativado");
        Ok(affected)
    }

    pub async fn delete_template(&self, teacher_id: i64, template_id: i64) -> Result<u64, AppError> {
        self.owned_template(teacher_id, template_id).await?;
        let affected = self.templates.delete_templates(TemplateSelector::One(template_id)).await?;
        tracing::info!(template_id, teacher_id, "Modelo removido");
        Ok(affected)
    }

    pub async fn deactivate_group(&self, teacher_id: i64, group_id: Uuid) -> Result<u64, AppError> {
        self.list_group(teacher_id, group_id).await?;
        let affected = self.templates.deactivate_templates(TemplateSelector::Group(group_id)).await?;
        tracing::info!(%group_id, teacher_id, affected, "Grupo de modelos desativado");
        Ok(affected)
    }

    pub async fn delete_group(&self, teacher_id: i64, group_id: Uuid) -> Result<u64, AppError> {
        self.list_group(teacher_id, group_id).await?;
        let affected = self.templates.delete_templates(TemplateSelector::Group(group_id)).await?;
        tracing::info!(%group_id, teacher_id, affected, "Grupo de modelos removido");
        Ok(affected)
    }

    // =========================================================================
    //  SLOTS AVULSOS
    // =========================================================================

    pub async fn create_slot(
        &self,
        teacher_id: i64,
        subject_id: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Slot, AppError> {
        self.owned_subject(teacher_id, subject_id).await?;

        if end_time <= start_time {
            return Err(AppError::InvalidTime("O fim deve ser posterior ao início".to_string()));
        }
        if start_time < self.clock.now() {
            return Err(AppError::InvalidTime("Não é possível criar slots no passado".to_string()));
        }

        let slot = self
            .slots
            .insert_slot(&NewSlot {
                teacher_id,
                subject_id,
                template_id: None,
                start_time,
                end_time,
            })
            .await?;

        tracing::info!(slot_id = slot.id, teacher_id, %start_time, "Slot avulso criado");
        Ok(slot)
    }

    /// Grava cada candidato isoladamente; falhas (inclusive duplicatas) são
    /// só contadas.
    async fn insert_each(
        &self,
        teacher_id: i64,
        subject_id: i64,
        candidates: &[(DateTime<Utc>, DateTime<Utc>)],
    ) -> CreationReport {
        let mut report = CreationReport { created: 0, attempted: candidates.len() };

        for (start_time, end_time) in candidates {
            let new = NewSlot {
                teacher_id,
                subject_id,
                template_id: None,
                start_time: *start_time,
                end_time: *end_time,
            };
            match self.slots.insert_slot(&new).await {
                Ok(_) => report.created += 1,
                Err(e) => tracing::warn!(teacher_id, %start_time, error = %e, "falha ao criar slot"),
            }
        }

        report
    }

    /// Slots avulsos no mesmo dia da semana e horário por `weeks` semanas,
    /// sem criar modelo recorrente.
    pub async fn create_slots_for_period(
        &self,
        teacher_id: i64,
        subject_id: i64,
        weekday: i32,
        start: TimeOfDay,
        weeks: Option<u32>,
    ) -> Result<CreationReport, AppError> {
        let subject = self.owned_subject(teacher_id, subject_id).await?;
        let weekday = validate_weekday(weekday)?;
        let (hour, minute) = validate_time_of_day(start)?;
        let duration = validate_duration(subject.duration_minutes)?;

        let candidates = materializer::weekly_occurrences(
            self.settings.default_timezone,
            self.clock.now(),
            weekday,
            hour,
            minute,
            i64::from(duration),
            weeks.unwrap_or(DEFAULT_PERIOD_WEEKS),
        );

        let report = self.insert_each(teacher_id, subject_id, &candidates).await;
        tracing::info!(teacher_id, subject_id, created = report.created, attempted = report.attempted, "Slots do período criados");
        Ok(report)
    }

    /// Preenche um dia de trabalho com intervalos consecutivos da duração da
    /// disciplina, no próximo dia da semana pedido.
    pub async fn create_workday_slots(
        &self,
        teacher_id: i64,
        subject_id: i64,
        weekday: i32,
        start_hour: Option<u32>,
        end_hour: Option<u32>,
    ) -> Result<CreationReport, AppError> {
        let subject = self.owned_subject(teacher_id, subject_id).await?;
        let weekday = validate_weekday(weekday)?;
        let duration = validate_duration(subject.duration_minutes)?;
        let start_hour = start_hour.unwrap_or(DEFAULT_WORKDAY_START);
        let end_hour = end_hour.unwrap_or(DEFAULT_WORKDAY_END);

        if end_hour > 24 || start_hour >= end_hour {
            return Err(AppError::InvalidTime(format!(
                "Jornada inválida: {start_hour}h às {end_hour}h"
            )));
        }

        let tz = self.settings.default_timezone;
        let now = self.clock.now();
        let local_now = now.with_timezone(&tz);

        // Hoje, se ainda houver expediente; senão a próxima ocorrência
        let mut days_ahead = (weekday + 7 - local_now.weekday().num_days_from_sunday()) % 7;
        if days_ahead == 0 && local_now.hour() >= end_hour {
            days_ahead = 7;
        }
        let date = local_now
            .date_naive()
            .checked_add_days(Days::new(u64::from(days_ahead)))
            .ok_or_else(|| AppError::InvalidTime("Data fora do intervalo suportado".to_string()))?;

        let step = u32::try_from(duration).unwrap_or(u32::MAX);
        let slot_count = (end_hour - start_hour) * 60 / step;
        let mut candidates = Vec::new();
        for index in 0..slot_count {
            let offset = index * step;
            let (hour, minute) = (start_hour + offset / 60, offset % 60);
            let Some(start_time) = materializer::local_instant(tz, date, hour, minute) else {
                tracing::warn!(%date, hour, minute, "horário inexistente no fuso, ignorado");
                continue;
            };
            if start_time < now {
                continue;
            }
            candidates.push((start_time, start_time + Duration::minutes(i64::from(duration))));
        }

        let report = self.insert_each(teacher_id, subject_id, &candidates).await;
        tracing::info!(teacher_id, subject_id, %date, created = report.created, attempted = report.attempted, "Dia de trabalho preenchido");
        Ok(report)
    }

    // =========================================================================
    //  RETIRADA E CONSULTAS
    // =========================================================================

    /// Retira um slot da agenda. Um slot reservado tem a reserva ativa
    /// cancelada na mesma transação.
    pub async fn withdraw_slot(&self, teacher_id: i64, slot_id: i64) -> Result<Slot, AppError> {
        let slot = self
            .slots
            .find_slot(slot_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Slot))?;

        if slot.teacher_id != teacher_id {
            return Err(AppError::Forbidden);
        }
        if slot.status.next(SlotAction::Withdraw).is_none() {
            return Err(ConflictReason::InvalidSlotTransition {
                from: slot.status,
                action: SlotAction::Withdraw,
            }
            .into());
        }

        let (slot, canceled_booking) = self
            .bookings
            .withdraw_slot(slot_id, slot.status, self.clock.now())
            .await?;

        tracing::info!(slot_id, teacher_id, had_booking = canceled_booking.is_some(), "Slot retirado");
        self.events.publish(DomainEvent::SlotWithdrawn { slot: slot.clone(), canceled_booking });
        Ok(slot)
    }

    /// Slots livres da disciplina no intervalo, em ordem cronológica.
    pub async fn get_available_slots(
        &self,
        subject_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AppError> {
        if from >= to {
            return Err(AppError::InvalidTime("Intervalo vazio: 'from' deve ser anterior a 'to'".to_string()));
        }
        self.slots.list_free_slots(subject_id, from, to).await
    }

    pub async fn get_teacher_schedule(
        &self,
        teacher_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AppError> {
        if from >= to {
            return Err(AppError::InvalidTime("Intervalo vazio: 'from' deve ser anterior a 'to'".to_string()));
        }
        self.slots.list_teacher_slots(teacher_id, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::clock::FixedClock,
        db::memory::MemoryStore,
        models::{
            booking::{BookingStatus, NewBooking},
            schedule::SlotStatus,
        },
    };

    const TEACHER: i64 = 10;
    const OTHER_TEACHER: i64 = 11;
    const SUBJECT: i64 = 20;

    // Segunda-feira, 08:00 UTC
    const MONDAY_MORNING: &str = "2025-06-02T08:00:00Z";

    async fn service_at(now: &str) -> (ScheduleService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store
            .put_subject(Subject {
                id: SUBJECT,
                teacher_id: TEACHER,
                name: "Matemática".to_string(),
                duration_minutes: 60,
                is_active: true,
                requires_booking_approval: false,
            })
            .await;

        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at(now));
        let events = EventBus::new(16);
        let materializer = SlotMaterializer::new(store.clone(), store.clone(), clock.clone(), events.clone());
        let service = ScheduleService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            materializer,
            clock,
            events,
            ScheduleSettings {
                default_timezone: chrono_tz::UTC,
                seed_weeks_ahead: 4,
            },
        );
        (service, store)
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        FixedClock::at(rfc3339).now()
    }

    fn nine() -> TimeOfDay {
        TimeOfDay { hour: 9, minute: 0 }
    }

    fn whole_range() -> (DateTime<Utc>, DateTime<Utc>) {
        (DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)
    }

    #[tokio::test]
    async fn template_creation_seeds_slots() {
        let (service, _) = service_at(MONDAY_MORNING).await;

        let template = service
            .create_template(TEACHER, SUBJECT, 1, nine(), None, None)
            .await
            .unwrap();
        assert_eq!(template.duration_minutes, 60);
        assert_eq!(template.timezone, "UTC");

        let (from, to) = whole_range();
        let slots = service.get_teacher_schedule(TEACHER, from, to).await.unwrap();
        assert_eq!(slots.len(), 4);
    }

    #[tokio::test]
    async fn template_group_creates_one_template_per_combination() {
        let (service, _) = service_at(MONDAY_MORNING).await;
        let ten_thirty = TimeOfDay { hour: 10, minute: 30 };

        let group = service
            .create_template_group(TEACHER, SUBJECT, &[1, 3, 1], &[nine(), ten_thirty], Some(45), Some("UTC"))
            .await
            .unwrap();

        assert_eq!(group.templates.len(), 4);
        assert!(group.templates.iter().all(|t| t.group_id == group.group_id));
        assert_eq!(group.seeded_slots, 16);

        let listed = service.list_group(TEACHER, group.group_id).await.unwrap();
        assert_eq!(listed.len(), 4);
    }

    #[tokio::test]
    async fn template_rejects_out_of_range_fields() {
        let (service, _) = service_at(MONDAY_MORNING).await;

        let err = service.create_template(TEACHER, SUBJECT, 7, nine(), None, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTime(_)));

        let bad_time = TimeOfDay { hour: 24, minute: 0 };
        let err = service.create_template(TEACHER, SUBJECT, 1, bad_time, None, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTime(_)));

        let err = service.create_template(TEACHER, SUBJECT, 1, nine(), Some(0), None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTime(_)));

        let err = service
            .create_template(TEACHER, SUBJECT, 1, nine(), None, Some("Lua/Crateras"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn templates_are_owned_by_their_teacher() {
        let (service, _) = service_at(MONDAY_MORNING).await;

        let err = service.create_template(OTHER_TEACHER, SUBJECT, 1, nine(), None, None).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let template = service.create_template(TEACHER, SUBJECT, 1, nine(), None, None).await.unwrap();
        let err = service.delete_template(OTHER_TEACHER, template.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let err = service.list_group(OTHER_TEACHER, template.group_id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let err = service.deactivate_template(TEACHER, 9_999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(Entity::Template)));

        let err = service.delete_group(TEACHER, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(Entity::TemplateGroup)));
    }

    #[tokio::test]
    async fn deleting_a_group_keeps_its_slots_without_provenance() {
        let (service, _) = service_at(MONDAY_MORNING).await;
        let group = service
            .create_template_group(TEACHER, SUBJECT, &[1, 2], &[nine()], None, None)
            .await
            .unwrap();

        assert_eq!(service.delete_group(TEACHER, group.group_id).await.unwrap(), 2);
        assert!(service.list_templates(TEACHER).await.unwrap().is_empty());

        let (from, to) = whole_range();
        let slots = service.get_teacher_schedule(TEACHER, from, to).await.unwrap();
        assert_eq!(slots.len(), group.seeded_slots);
        assert!(slots.iter().all(|s| s.template_id.is_none()));
    }

    #[tokio::test]
    async fn deactivating_a_group_marks_every_template() {
        let (service, _) = service_at(MONDAY_MORNING).await;
        let group = service
            .create_template_group(TEACHER, SUBJECT, &[1, 2], &[nine()], None, None)
            .await
            .unwrap();

        assert_eq!(service.deactivate_group(TEACHER, group.group_id).await.unwrap(), 2);
        let templates = service.list_templates(TEACHER).await.unwrap();
        assert!(templates.iter().all(|t| !t.is_active));
    }

    #[tokio::test]
    async fn ad_hoc_slot_rules() {
        let (service, _) = service_at(MONDAY_MORNING).await;

        let slot = service
            .create_slot(TEACHER, SUBJECT, at("2025-06-03T10:00:00Z"), at("2025-06-03T11:00:00Z"))
            .await
            .unwrap();
        assert_eq!(slot.status, SlotStatus::Free);
        assert_eq!(slot.template_id, None);

        let err = service
            .create_slot(TEACHER, SUBJECT, at("2025-06-03T10:00:00Z"), at("2025-06-03T11:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ConflictReason::DuplicateSlot)));

        let err = service
            .create_slot(TEACHER, SUBJECT, at("2025-06-01T10:00:00Z"), at("2025-06-01T11:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTime(_)));

        let err = service
            .create_slot(TEACHER, SUBJECT, at("2025-06-03T11:00:00Z"), at("2025-06-03T10:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTime(_)));

        let err = service
            .create_slot(OTHER_TEACHER, SUBJECT, at("2025-06-04T10:00:00Z"), at("2025-06-04T11:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn period_creation_is_not_idempotent_but_never_duplicates() {
        let (service, _) = service_at(MONDAY_MORNING).await;

        let first = service.create_slots_for_period(TEACHER, SUBJECT, 1, nine(), None).await.unwrap();
        assert_eq!(first, CreationReport { created: 4, attempted: 4 });

        let second = service.create_slots_for_period(TEACHER, SUBJECT, 1, nine(), Some(4)).await.unwrap();
        assert_eq!(second, CreationReport { created: 0, attempted: 4 });
    }

    #[tokio::test]
    async fn workday_fills_today_while_the_day_is_not_over() {
        // Segunda-feira, 10:30: os intervalos de 09:00 e 10:00 já passaram
        let (service, _) = service_at("2025-06-02T10:30:00Z").await;

        let report = service.create_workday_slots(TEACHER, SUBJECT, 1, None, None).await.unwrap();
        assert_eq!(report, CreationReport { created: 7, attempted: 7 });

        let (from, to) = whole_range();
        let slots = service.get_teacher_schedule(TEACHER, from, to).await.unwrap();
        assert_eq!(slots.first().map(|s| s.start_time), Some(at("2025-06-02T11:00:00Z")));
        assert_eq!(slots.last().map(|s| s.end_time), Some(at("2025-06-02T18:00:00Z")));
    }

    #[tokio::test]
    async fn workday_moves_to_next_week_after_hours() {
        let (service, _) = service_at("2025-06-02T19:00:00Z").await;

        let report = service.create_workday_slots(TEACHER, SUBJECT, 1, Some(9), Some(12)).await.unwrap();
        assert_eq!(report.created, 3);

        let (from, to) = whole_range();
        let slots = service.get_teacher_schedule(TEACHER, from, to).await.unwrap();
        assert_eq!(slots[0].start_time, at("2025-06-09T09:00:00Z"));
    }

    #[tokio::test]
    async fn workday_rejects_inverted_hours() {
        let (service, _) = service_at(MONDAY_MORNING).await;
        let err = service
            .create_workday_slots(TEACHER, SUBJECT, 2, Some(18), Some(9))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTime(_)));
    }

    #[tokio::test]
    async fn withdrawn_slot_never_returns_to_free() {
        let (service, store) = service_at(MONDAY_MORNING).await;
        let slot = service
            .create_slot(TEACHER, SUBJECT, at("2025-06-03T10:00:00Z"), at("2025-06-03T11:00:00Z"))
            .await
            .unwrap();

        let withdrawn = service.withdraw_slot(TEACHER, slot.id).await.unwrap();
        assert_eq!(withdrawn.status, SlotStatus::Canceled);

        let err = service.withdraw_slot(TEACHER, slot.id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Conflict(ConflictReason::InvalidSlotTransition { from: SlotStatus::Canceled, .. })
        ));

        let err = store
            .reserve_slot(
                &NewBooking {
                    student_id: 99,
                    teacher_id: TEACHER,
                    subject_id: SUBJECT,
                    slot_id: slot.id,
                    status: BookingStatus::Confirmed,
                },
                at(MONDAY_MORNING),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ConflictReason::SlotUnavailable)));

        let free = service
            .get_available_slots(SUBJECT, at("2025-06-01T00:00:00Z"), at("2025-07-01T00:00:00Z"))
            .await
            .unwrap();
        assert!(free.is_empty());
    }

    #[tokio::test]
    async fn withdrawing_a_booked_slot_cancels_its_booking() {
        let (service, store) = service_at(MONDAY_MORNING).await;
        let slot = service
            .create_slot(TEACHER, SUBJECT, at("2025-06-03T10:00:00Z"), at("2025-06-03T11:00:00Z"))
            .await
            .unwrap();
        let (_, booking) = store
            .reserve_slot(
                &NewBooking {
                    student_id: 99,
                    teacher_id: TEACHER,
                    subject_id: SUBJECT,
                    slot_id: slot.id,
                    status: BookingStatus::Confirmed,
                },
                at(MONDAY_MORNING),
            )
            .await
            .unwrap();

        let err = service.withdraw_slot(OTHER_TEACHER, slot.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        service.withdraw_slot(TEACHER, slot.id).await.unwrap();

        let booking = store.find_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Canceled);
        let slot = store.find_slot(slot.id).await.unwrap().unwrap();
        assert_eq!(slot.student_id, None);
    }

    #[tokio::test]
    async fn queries_reject_empty_ranges() {
        let (service, _) = service_at(MONDAY_MORNING).await;
        let t = at(MONDAY_MORNING);
        assert!(matches!(
            service.get_available_slots(SUBJECT, t, t).await.unwrap_err(),
            AppError::InvalidTime(_)
        ));
        assert!(matches!(
            service.get_teacher_schedule(TEACHER, t, t).await.unwrap_err(),
            AppError::InvalidTime(_)
        ));
    }
}
