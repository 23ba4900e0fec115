// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use chrono_tz::Tz;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::clock::{Clock, SystemClock},
    db::{
        store::{BookingStore, SlotStore, SubjectLookup, TemplateStore},
        MemoryStore, PgStore, SubjectRepository,
    },
    services::{
        events::EventBus,
        generation_task::GenerationSchedule,
        materializer::SlotMaterializer,
        schedule_service::ScheduleSettings,
        BookingService, DialogStore, ScheduleService,
    },
};

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("STORAGE_BACKEND desconhecido: '{other}' (use 'postgres' ou 'memory')"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub storage_backend: StorageBackend,
    pub database_max_connections: u32,
    pub generation_interval: Duration,
    pub generation_weeks_ahead: u32,
    pub seed_weeks_ahead: u32,
    pub default_timezone: Tz,
}

/// Lê `key` do ambiente; ausente ou vazia, usa `default`.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("valor inválido para {key}: '{raw}' ({e})")),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let storage_backend = env_or("STORAGE_BACKEND", StorageBackend::Postgres)?;
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL deve ser definida com STORAGE_BACKEND=postgres");
        }

        let interval_hours: u64 = env_or("GENERATION_INTERVAL_HOURS", 24)?;
        if interval_hours == 0 {
            anyhow::bail!("GENERATION_INTERVAL_HOURS deve ser maior que zero");
        }

        let default_timezone: Tz = env_or("DEFAULT_TIMEZONE", chrono_tz::UTC)?;

        Ok(Self {
            database_url,
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            storage_backend,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 5)?,
            generation_interval: Duration::from_secs(interval_hours * 3600),
            generation_weeks_ahead: env_or("GENERATION_WEEKS_AHEAD", 4)?,
            seed_weeks_ahead: env_or("SEED_WEEKS_AHEAD", 4)?,
            default_timezone,
        })
    }

    pub fn generation_schedule(&self) -> GenerationSchedule {
        GenerationSchedule {
            interval: self.generation_interval,
            weeks_ahead: self.generation_weeks_ahead,
        }
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub schedule_service: ScheduleService,
    pub booking_service: BookingService,
    pub materializer: SlotMaterializer,
    pub dialogs: DialogStore,
    pub events: EventBus,
    pub generation_weeks_ahead: u32,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        match config.storage_backend {
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL deve ser definida")?;

                let db_pool = PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!().run(&db_pool).await?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                // --- Monta o gráfico de dependências ---
                let store = Arc::new(PgStore::new(db_pool.clone()));
                let subjects = Arc::new(SubjectRepository::new(db_pool));
                Ok(Self::build(config, store.clone(), store.clone(), store, subjects, Arc::new(SystemClock)))
            }
            StorageBackend::Memory => {
                tracing::warn!("⚠️ Usando store em memória: os dados somem ao reiniciar");
                Ok(Self::in_memory(config, Arc::new(MemoryStore::new()), Arc::new(SystemClock)))
            }
        }
    }

    pub fn in_memory(config: &Config, store: Arc<MemoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self::build(config, store.clone(), store.clone(), store.clone(), store, clock)
    }

    fn build(
        config: &Config,
        templates: Arc<dyn TemplateStore>,
        slots: Arc<dyn SlotStore>,
        bookings: Arc<dyn BookingStore>,
        subjects: Arc<dyn SubjectLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let events = EventBus::new(EVENT_BUS_CAPACITY);

        let materializer = SlotMaterializer::new(templates.clone(), slots.clone(), clock.clone(), events.clone());

        let schedule_service = ScheduleService::new(
            templates,
            slots.clone(),
            bookings.clone(),
            subjects.clone(),
            materializer.clone(),
            clock.clone(),
            events.clone(),
            ScheduleSettings {
                default_timezone: config.default_timezone,
                seed_weeks_ahead: config.seed_weeks_ahead,
            },
        );

        let booking_service = BookingService::new(slots, bookings, subjects, clock, events.clone());

        Self {
            schedule_service,
            booking_service,
            materializer,
            dialogs: DialogStore::new(),
            events,
            generation_weeks_ahead: config.generation_weeks_ahead,
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            bind_addr: "127.0.0.1:0".to_string(),
            storage_backend: StorageBackend::Memory,
            database_max_connections: 1,
            generation_interval: Duration::from_secs(3600),
            generation_weeks_ahead: 4,
            seed_weeks_ahead: 4,
            default_timezone: chrono_tz::UTC,
        }
    }
}
