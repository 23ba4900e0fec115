// src/services/events.rs

use tokio::{sync::broadcast, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::models::events::DomainEvent;

/// Barramento de eventos de domínio. O núcleo só publica; quem renderiza
/// (bot, e-mail...) assina.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: DomainEvent) {
        let name = event.name();
        // Sem assinantes não é erro: o evento simplesmente não tem destino.
        if self.sender.send(event).is_err() {
            tracing::debug!(event = name, "evento publicado sem assinantes");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

/// Repassa os eventos para o log até o cancelamento.
pub fn spawn_notification_relay(bus: &EventBus, cancel: CancellationToken) -> JoinHandle<()> {
    let mut receiver = bus.subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = receiver.recv() => match received {
                    Ok(event) => {
                        let payload = serde_json::to_string(&event).unwrap_or_default();
                        tracing::info!(event = event.name(), %payload, "📣 Notificação");
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "relay de notificações atrasado, eventos descartados");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        tracing::info!("relay de notificações encerrado");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::SlotsMaterialized { template_id: 1, teacher_id: 2, count: 3 });

        match rx.recv().await {
            Ok(DomainEvent::SlotsMaterialized { count, .. }) => assert_eq!(count, 3),
            other => panic!("evento inesperado: {other:?}"),
        }
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new(1);
        bus.publish(DomainEvent::SlotsMaterialized { template_id: 1, teacher_id: 2, count: 0 });
    }
}
