use crate::models::{HostRegistry, ServerMessage};
use crate::status::StatusStore;
use crate::subscribers::{Delivery, SubscriberRegistry};
use axum::extract::ws::Message;
use tracing::{debug, error, warn};

/// Diffuse des snapshots complets des statuts à tous les abonnés connectés.
#[derive(Clone)]
pub struct Broadcaster {
    hosts: HostRegistry,
    store: StatusStore,
    subscribers: SubscriberRegistry,
}

impl Broadcaster {
    pub fn new(hosts: HostRegistry, store: StatusStore, subscribers: SubscriberRegistry) -> Self {
        Self { hosts, store, subscribers }
    }

    /// Message `update` sérialisé pour l'état courant, dans l'ordre du registre.
    pub fn update_message(&self) -> serde_json::Result<String> {
        let snapshot = self.store.snapshot(&self.hosts);
        serde_json::to_string(&ServerMessage::Update(snapshot))
    }

    /// Livraison best-effort d'un snapshot. Le verrou des statuts est relâché
    /// avant de prendre celui des abonnés ; un abonné qui refuse le message est
    /// fermé et retiré.
    pub fn publish(&self) -> Delivery {
        let payload = match self.update_message() {
            Ok(p) => p,
            Err(e) => {
                error!("failed to serialize update: {e}");
                return Delivery::default();
            }
        };

        let report = self.subscribers.deliver(&Message::Text(payload.into()));
        for id in &report.pruned {
            warn!(subscriber = %id, "send failed, subscriber dropped");
        }
        debug!(delivered = report.delivered, pruned = report.pruned.len(), "update published");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use tokio::sync::mpsc;

    fn setup(hosts: &[&str]) -> (Broadcaster, StatusStore, SubscriberRegistry) {
        let hosts: HostRegistry = hosts.iter().map(|h| h.to_string()).collect::<Vec<_>>().into();
        let store = StatusStore::new();
        store.initialize(&hosts);
        let subscribers = SubscriberRegistry::new();
        let broadcaster = Broadcaster::new(hosts, store.clone(), subscribers.clone());
        (broadcaster, store, subscribers)
    }

    fn recv_text(rx: &mut mpsc::Receiver<Message>) -> String {
        match rx.try_recv() {
            Ok(Message::Text(t)) => t.as_str().to_owned(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[test]
    fn test_initial_message_is_unknown() {
        let (broadcaster, _, _) = setup(&["a", "b"]);
        assert_eq!(
            broadcaster.update_message().unwrap(),
            r#"{"type":"update","data":[{"host":"a","status":"UNKNOWN"},{"host":"b","status":"UNKNOWN"}]}"#
        );
    }

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let (broadcaster, store, subscribers) = setup(&["a", "b"]);
        store.apply(vec![("b".to_string(), Status::Down), ("a".to_string(), Status::Up)]);

        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        subscribers.register(tx1);
        subscribers.register(tx2);

        let report = broadcaster.publish();
        assert_eq!(report.delivered, 2);

        let expected =
            r#"{"type":"update","data":[{"host":"a","status":"UP"},{"host":"b","status":"DOWN"}]}"#;
        assert_eq!(recv_text(&mut rx1), expected);
        assert_eq!(recv_text(&mut rx2), expected);
    }

    #[test]
    fn test_failed_subscriber_is_absent_afterwards() {
        let (broadcaster, _, subscribers) = setup(&["a"]);
        let (tx_alive, mut rx_alive) = mpsc::channel(8);
        let (tx_dead, rx_dead) = mpsc::channel(8);
        let alive = subscribers.register(tx_alive);
        let dead = subscribers.register(tx_dead);

        drop(rx_dead);
        let report = broadcaster.publish();
        assert_eq!(report.pruned, vec![dead]);
        assert!(!subscribers.contains(dead));

        for _ in 0..3 {
            let report = broadcaster.publish();
            assert_eq!(report.delivered, 1);
            assert!(report.pruned.is_empty());
        }
        assert!(subscribers.contains(alive));
        for _ in 0..4 {
            recv_text(&mut rx_alive);
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let (broadcaster, _, _) = setup(&[]);
        assert_eq!(broadcaster.publish(), Delivery::default());
    }
}
