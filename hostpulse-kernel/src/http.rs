/*!
 * API HTTP HOSTPULSE - Serveur HTTP principal du kernel
 *
 * RÔLE :
 * Expose le dashboard, le canal live WebSocket et quelques routes de lecture.
 *
 * ROUTES :
 * - GET /               → dashboard statique
 * - GET /ws             → flux live {"type":"update","data":[...]}
 * - GET /status         → snapshot courant (JSON)
 * - GET /health         → "ok"
 * - GET /system/health  → état du kernel (uptime, hôtes, abonnés, cycles)
 */

use crate::broadcast::Broadcaster;
use crate::config::KernelConfig;
use crate::health::{HealthTracker, KernelHealth};
use crate::models::{HostRegistry, Snapshot};
use crate::prober::{Probe, Prober};
use crate::status::StatusStore;
use crate::subscribers::SubscriberRegistry;
use crate::ws::ws_handler;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

const DASHBOARD: &str = include_str!("../web/index.html");

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<KernelConfig>,
    pub hosts: HostRegistry,
    pub store: StatusStore,
    pub subscribers: SubscriberRegistry,
    pub broadcaster: Broadcaster,
    pub health_tracker: HealthTracker,
}

impl AppState {
    /// Construit l'état partagé. Chaque hôte démarre en `Unknown` avant
    /// qu'aucune tâche ne puisse lire le store.
    pub fn new(cfg: KernelConfig) -> Self {
        let hosts = cfg.hosts.clone();
        let store = StatusStore::new();
        store.initialize(&hosts);
        let subscribers = SubscriberRegistry::new();
        let broadcaster = Broadcaster::new(hosts.clone(), store.clone(), subscribers.clone());

        Self {
            cfg: Arc::new(cfg),
            hosts,
            store,
            subscribers,
            broadcaster,
            health_tracker: HealthTracker::new(),
        }
    }

    pub fn prober<P: Probe + 'static>(&self, probe: P) -> Prober<P> {
        Prober::new(
            self.hosts.clone(),
            self.store.clone(),
            self.broadcaster.clone(),
            self.health_tracker.clone(),
            probe,
            self.cfg.check_interval,
        )
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/ws", get(ws_handler))
        .route("/status", get(get_status))
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .with_state(app_state)
}

// GET / (dashboard)
async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD)
}

// GET /status (snapshot, ordre du registre)
async fn get_status(State(app): State<AppState>) -> Json<Snapshot> {
    Json(app.store.snapshot(&app.hosts))
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health_tracker.get_health(app.hosts.len(), &app.subscribers))
}
