//src/main.rs

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use crate::{
    config::{AppState, Config},
    services::{events::spawn_notification_relay, generation_task::spawn_generation_task},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    // Se a configuração ou o banco falharem, a aplicação não deve iniciar.
    let app_state = AppState::new(&config).await?;

    // Tarefas de fundo: param juntas no desligamento
    let shutdown = CancellationToken::new();
    let relay = spawn_notification_relay(&app_state.events, shutdown.clone());
    let generation = spawn_generation_task(
        app_state.materializer.clone(),
        config.generation_schedule(),
        shutdown.clone(),
    );

    let app = routes::app_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    let _ = tokio::join!(relay, generation);
    tracing::info!("👋 Servidor encerrado");
    Ok(())
}

/// Ctrl+C, SIGTERM (enviado por orquestradores de contêiner) ou cancelamento interno.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "falha ao escutar Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "falha ao escutar SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Ctrl+C recebido"),
        () = terminate => tracing::info!("SIGTERM recebido"),
        () = shutdown.cancelled() => {}
    }
    tracing::info!("sinal de desligamento recebido");
    shutdown.cancel();
}
