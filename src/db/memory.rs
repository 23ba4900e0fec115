// src/db/memory.rs
//
// Store em memória com a mesma semântica do Postgres: chave única
// (teacher_id, start_time), UPDATEs condicionais e unidades atômicas sob um
// único lock. Usado nos testes e com STORAGE_BACKEND=memory.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    common::error::{AppError, ConflictReason},
    db::store::{BookingStore, SlotStore, SubjectLookup, TemplateStore},
    models::{
        booking::{Booking, BookingStatus, NewBooking},
        schedule::{NewSlot, NewTemplate, RecurringTemplate, Slot, SlotAction, SlotStatus, TemplateSelector},
        subject::Subject,
    },
};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    templates: BTreeMap<i64, RecurringTemplate>,
    slots: BTreeMap<i64, Slot>,
    slot_keys: HashMap<(i64, DateTime<Utc>), i64>,
    bookings: BTreeMap<i64, Booking>,
    subjects: HashMap<i64, Subject>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn template_matches(template: &RecurringTemplate, selector: TemplateSelector) -> bool {
        match selector {
            TemplateSelector::One(id) => template.id == id,
            TemplateSelector::Group(group_id) => template.group_id == group_id,
        }
    }

    fn sorted_templates(mut templates: Vec<RecurringTemplate>) -> Vec<RecurringTemplate> {
        templates.sort_by_key(|t| (t.weekday, t.start_hour, t.start_minute, t.id));
        templates
    }

    fn active_booking_for_slot(&self, slot_id: i64) -> Option<&Booking> {
        self.bookings
            .values()
            .find(|b| b.slot_id == slot_id && b.status.is_active())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cadastra (ou substitui) uma disciplina. No Postgres isto é feito por outro subsistema.
    pub async fn put_subject(&self, subject: Subject) {
        let mut state = self.state.lock().await;
        state.subjects.insert(subject.id, subject);
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn insert_template(&self, new: &NewTemplate) -> Result<RecurringTemplate, AppError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let template = RecurringTemplate {
            id: state.next_id(),
            group_id: new.group_id,
            teacher_id: new.teacher_id,
            subject_id: new.subject_id,
            weekday: new.weekday,
            start_hour: new.start_hour,
            start_minute: new.start_minute,
            duration_minutes: new.duration_minutes,
            timezone: new.timezone.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn find_template(&self, id: i64) -> Result<Option<RecurringTemplate>, AppError> {
        let state = self.state.lock().await;
        Ok(state.templates.get(&id).cloned())
    }

    async fn list_templates_by_teacher(&self, teacher_id: i64) -> Result<Vec<RecurringTemplate>, AppError> {
        let state = self.state.lock().await;
        let templates = state
            .templates
            .values()
            .filter(|t| t.teacher_id == teacher_id)
            .cloned()
            .collect();
        Ok(MemoryState::sorted_templates(templates))
    }

    async fn list_templates_by_group(&self, group_id: Uuid) -> Result<Vec<RecurringTemplate>, AppError> {
        let state = self.state.lock().await;
        let templates = state
            .templates
            .values()
            .filter(|t| t.group_id == group_id)
            .cloned()
            .collect();
        Ok(MemoryState::sorted_templates(templates))
    }

    async fn list_active_templates(&self) -> Result<Vec<RecurringTemplate>, AppError> {
        let state = self.state.lock().await;
        let templates = state.templates.values().filter(|t| t.is_active).cloned().collect();
        Ok(MemoryState::sorted_templates(templates))
    }

    async fn deactivate_templates(&self, selector: TemplateSelector) -> Result<u64, AppError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut affected = 0;
        for template in state.templates.values_mut() {
            if MemoryState::template_matches(template, selector) {
                template.is_active = false;
                template.updated_at = now;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete_templates(&self, selector: TemplateSelector) -> Result<u64, AppError> {
        let mut state = self.state.lock().await;
        let removed: Vec<i64> = state
            .templates
            .values()
            .filter(|t| MemoryState::template_matches(t, selector))
            .map(|t| t.id)
            .collect();

        for id in &removed {
            state.templates.remove(id);
        }
        // ON DELETE SET NULL
        for slot in state.slots.values_mut() {
            if slot.template_id.is_some_and(|id| removed.contains(&id)) {
                slot.template_id = None;
            }
        }
        Ok(removed.len() as u64)
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn insert_slot(&self, new: &NewSlot) -> Result<Slot, AppError> {
        let mut state = self.state.lock().await;
        let key = (new.teacher_id, new.start_time);
        if state.slot_keys.contains_key(&key) {
            return Err(ConflictReason::DuplicateSlot.into());
        }

        let slot = Slot {
            id: state.next_id(),
            teacher_id: new.teacher_id,
            subject_id: new.subject_id,
            template_id: new.template_id,
            start_time: new.start_time,
            end_time: new.end_time,
            status: SlotStatus::Free,
            student_id: None,
            created_at: Utc::now(),
        };
        state.slot_keys.insert(key, slot.id);
        state.slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    async fn slot_exists(&self, teacher_id: i64, start_time: DateTime<Utc>) -> Result<bool, AppError> {
        let state = self.state.lock().await;
        Ok(state.slot_keys.contains_key(&(teacher_id, start_time)))
    }

    async fn find_slot(&self, id: i64) -> Result<Option<Slot>, AppError> {
        let state = self.state.lock().await;
        Ok(state.slots.get(&id).cloned())
    }

    async fn list_free_slots(
        &self,
        subject_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AppError> {
        let state = self.state.lock().await;
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|s| {
                s.subject_id == subject_id
                    && s.status == SlotStatus::Free
                    && s.start_time >= from
                    && s.start_time < to
            })
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.start_time);
        Ok(slots)
    }

    async fn list_teacher_slots(
        &self,
        teacher_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AppError> {
        let state = self.state.lock().await;
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|s| s.teacher_id == teacher_id && s.start_time >= from && s.start_time < to)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.start_time);
        Ok(slots)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_booking(&self, id: i64) -> Result<Option<Booking>, AppError> {
        let state = self.state.lock().await;
        Ok(state.bookings.get(&id).cloned())
    }

    async fn find_active_booking_for_slot(&self, slot_id: i64) -> Result<Option<Booking>, AppError> {
        let state = self.state.lock().await;
        Ok(state.active_booking_for_slot(slot_id).cloned())
    }

    async fn list_pending_bookings(&self, teacher_id: i64) -> Result<Vec<Booking>, AppError> {
        let state = self.state.lock().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.teacher_id == teacher_id && b.status == BookingStatus::Pending)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.created_at, b.id));
        Ok(bookings)
    }

    async fn list_student_bookings(&self, student_id: i64) -> Result<Vec<Booking>, AppError> {
        let state = self.state.lock().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.student_id == student_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| std::cmp::Reverse((b.created_at, b.id)));
        Ok(bookings)
    }

    async fn list_teacher_bookings(&self, teacher_id: i64) -> Result<Vec<Booking>, AppError> {
        let state = self.state.lock().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.teacher_id == teacher_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| std::cmp::Reverse((b.created_at, b.id)));
        Ok(bookings)
    }

    async fn reserve_slot(&self, new: &NewBooking, now: DateTime<Utc>) -> Result<(Slot, Booking), AppError> {
        let mut state = self.state.lock().await;

        let slot = match state.slots.get_mut(&new.slot_id) {
            Some(slot) => match slot.status.next(SlotAction::Reserve) {
                Some(next) => {
                    slot.status = next;
                    slot.student_id = Some(new.student_id);
                    slot.clone()
                }
                None => return Err(ConflictReason::SlotUnavailable.into()),
            },
            None => return Err(ConflictReason::SlotUnavailable.into()),
        };

        let booking = Booking {
            id: state.next_id(),
            student_id: new.student_id,
            teacher_id: new.teacher_id,
            subject_id: new.subject_id,
            slot_id: new.slot_id,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(booking.id, booking.clone());
        Ok((slot, booking))
    }

    async fn transition_booking(
        &self,
        booking_id: i64,
        expected: BookingStatus,
        next: BookingStatus,
        release_slot: bool,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let mut state = self.state.lock().await;

        let slot_id = match state.bookings.get(&booking_id) {
            Some(booking) if booking.status == expected => booking.slot_id,
            _ => return Err(ConflictReason::StaleState.into()),
        };

        // Valida tudo antes de escrever: sem estado parcial visível
        if release_slot {
            let slot = state.slots.get_mut(&slot_id).ok_or(ConflictReason::StaleState)?;
            let next = slot.status.next(SlotAction::Release).ok_or(ConflictReason::StaleState)?;
            slot.status = next;
            slot.student_id = None;
        }

        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or(ConflictReason::StaleState)?;
        booking.status = next;
        booking.updated_at = now;
        Ok(booking.clone())
    }

    async fn withdraw_slot(
        &self,
        slot_id: i64,
        expected: SlotStatus,
        now: DateTime<Utc>,
    ) -> Result<(Slot, Option<Booking>), AppError> {
        let mut state = self.state.lock().await;

        let slot = match state.slots.get_mut(&slot_id) {
            Some(slot) if slot.status == expected => {
                slot.status = SlotStatus::Canceled;
                slot.student_id = None;
                slot.clone()
            }
            _ => return Err(ConflictReason::StaleState.into()),
        };

        let mut canceled_booking = None;
        if expected == SlotStatus::Booked {
            if let Some(booking) = state
                .bookings
                .values_mut()
                .find(|b| b.slot_id == slot_id && b.status.is_active())
            {
                booking.status = BookingStatus::Canceled;
                booking.updated_at = now;
                canceled_booking = Some(booking.clone());
            }
        }

        Ok((slot, canceled_booking))
    }
}

#[async_trait]
impl SubjectLookup for MemoryStore {
    async fn find_subject(&self, id: i64) -> Result<Option<Subject>, AppError> {
        let state = self.state.lock().await;
        Ok(state.subjects.get(&id).cloned())
    }
}
