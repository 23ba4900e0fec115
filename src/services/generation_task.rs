// src/services/generation_task.rs
//
// Geração periódica de slots: roda uma vez na subida do processo e depois a
// cada `interval`, até o token ser cancelado.

use std::time::Duration;

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::services::materializer::SlotMaterializer;

#[derive(Debug, Clone, Copy)]
pub struct GenerationSchedule {
    pub interval: Duration,
    pub weeks_ahead: u32,
}

pub fn spawn_generation_task(
    materializer: SlotMaterializer,
    schedule: GenerationSchedule,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_generation_loop(materializer, schedule, cancel).await;
    })
}

async fn run_generation_loop(materializer: SlotMaterializer, schedule: GenerationSchedule, cancel: CancellationToken) {
    // O primeiro tick é imediato
    let mut ticker = tokio::time::interval(schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = schedule.interval.as_secs(),
        weeks_ahead = schedule.weeks_ahead,
        "⏱️ Geração periódica de slots iniciada"
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match materializer.generate_all_active(schedule.weeks_ahead, &cancel).await {
                    Ok(summary) if summary.interrupted => break,
                    Ok(_) => {}
                    // Nova tentativa no próximo tick
                    Err(e) => tracing::error!(error = %e, "falha ao carregar modelos ativos"),
                }
            }
        }
    }

    tracing::info!("geração periódica de slots encerrada");
}
