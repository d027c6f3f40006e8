use crate::broadcast::Broadcaster;
use crate::health::HealthTracker;
use crate::models::{Host, HostRegistry, Status};
use crate::status::StatusStore;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info};

/// Test de joignabilité d'un hôte.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, host: &str) -> Status;
}

/// Simple connect TCP borné par un timeout. Tout échec (refus, injoignable,
/// résolution DNS, timeout) compte comme `Down`.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, host: &str) -> Status {
        match timeout(self.timeout, TcpStream::connect((host, self.port))).await {
            Ok(Ok(stream)) => {
                drop(stream);
                Status::Up
            }
            Ok(Err(e)) => {
                debug!(host, port = self.port, "probe failed: {e}");
                Status::Down
            }
            Err(_) => {
                debug!(host, port = self.port, "probe timed out");
                Status::Down
            }
        }
    }
}

pub struct Prober<P> {
    hosts: HostRegistry,
    store: StatusStore,
    broadcaster: Broadcaster,
    health: HealthTracker,
    probe: Arc<P>,
    interval: Duration,
}

impl<P: Probe + 'static> Prober<P> {
    pub fn new(
        hosts: HostRegistry,
        store: StatusStore,
        broadcaster: Broadcaster,
        health: HealthTracker,
        probe: P,
        interval: Duration,
    ) -> Self {
        Self { hosts, store, broadcaster, health, probe: Arc::new(probe), interval }
    }

    /// Sonde tous les hôtes en parallèle ; résultats dans l'ordre du registre,
    /// quel que soit l'ordre de complétion.
    pub async fn probe_all(&self) -> Vec<(Host, Status)> {
        join_all(self.hosts.iter().map(|host| async move {
            (host.clone(), self.probe.probe(host).await)
        }))
        .await
    }

    /// Un cycle complet : sonder, appliquer tous les résultats, publier une fois.
    pub async fn run_cycle(&self) {
        let results = self.probe_all().await;
        let up = results.iter().filter(|(_, s)| *s == Status::Up).count();
        self.store.apply(results);
        self.health.record_cycle();
        debug!(hosts = self.hosts.len(), up, "probe cycle done");
        self.broadcaster.publish();
    }

    /// Boucle infinie : cycle puis pause de l'intervalle (non raccourcie par la
    /// durée des sondes).
    pub async fn run(self) {
        loop {
            self.run_cycle().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Démarre la boucle de sondes. Sans hôte configuré, aucune tâche n'est
    /// lancée.
    pub fn spawn(self) -> Option<JoinHandle<()>> {
        if self.hosts.is_empty() {
            info!("no hosts configured, prober idle");
            return None;
        }
        info!(hosts = self.hosts.len(), interval_ms = self.interval.as_millis() as u64, "prober started");
        Some(tokio::spawn(self.run()))
    }
}
