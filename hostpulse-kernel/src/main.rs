/*!
 * HOSTPULSE KERNEL - Point d'entrée principal du serveur HostPulse
 *
 * RÔLE : Orchestration des modules : config, store de statuts, prober,
 * diffusion WebSocket, HTTP. Bootstrap du système complet avec logging.
 *
 * ARCHITECTURE : Prober → StatusStore → Broadcaster → abonnés WebSocket.
 * UTILITÉ : Dashboard "est-ce que ça répond" pour une petite flotte de machines.
 */

use hostpulse_kernel::config::KernelConfig;
use hostpulse_kernel::http::{self, AppState};
use hostpulse_kernel::prober::TcpProbe;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hostpulse_kernel=info")),
        )
        .init();

    let cfg = KernelConfig::load();
    info!(
        hosts = ?cfg.hosts,
        port = cfg.probe_port,
        interval_ms = cfg.check_interval.as_millis() as u64,
        "kernel starting"
    );

    let app_state = AppState::new(cfg.clone());

    // sonde TCP périodique
    let _prober = app_state
        .prober(TcpProbe::new(cfg.probe_port, cfg.dial_timeout))
        .spawn();

    let app = http::build_router(app_state);

    let listener = match TcpListener::bind(cfg.listen).await {
        Ok(l) => l,
        Err(e) => {
            error!("cannot bind {}: {e}", cfg.listen);
            return Err(e).with_context(|| format!("failed to bind {}", cfg.listen));
        }
    };
    info!("listening on http://{}", cfg.listen);
    axum::serve(listener, app).await.context("http server failed")?;
    Ok(())
}
