/*!
 * CONNEXIONS LIVE - Gestion des abonnés WebSocket
 *
 * RÔLE : Upgrade HTTP → WebSocket sur /ws, enregistrement de l'abonné,
 * snapshot immédiat, puis détection de la déconnexion.
 *
 * FONCTIONNEMENT :
 * - Chaque abonné a sa propre file d'envoi bornée + une tâche d'écriture
 *   (timeout par trame), isolée de la boucle de lecture
 * - La lecture sert uniquement à détecter la fin du transport ; le contenu
 *   entrant est ignoré
 * - Première erreur (lecture ou écriture) → retrait du registre + fermeture
 */

use crate::http::AppState;
use crate::subscribers::SubscriberId;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

// GET /ws
pub async fn ws_handler(State(app): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_failed_upgrade(|e| warn!("websocket upgrade failed: {e}"))
        .on_upgrade(move |socket| serve_subscriber(socket, app))
}

/// Vie d'un abonné, de l'enregistrement au retrait.
pub async fn serve_subscriber(socket: WebSocket, app: AppState) {
    let (sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::channel(app.cfg.subscriber_buffer);
    let send_timeout = app.cfg.send_timeout;

    let id = app.subscribers.register(tx);
    info!(subscriber = %id, total = app.subscribers.len(), "subscriber connected");

    let mut writer = tokio::spawn(write_loop(sink, rx, send_timeout, id));

    // état courant sans attendre le prochain cycle
    app.broadcaster.publish();

    let writer_done = tokio::select! {
        _ = read_until_closed(&mut stream, id) => false,
        _ = &mut writer => true,
    };

    app.subscribers.remove(id);
    if !writer_done && timeout(send_timeout, &mut writer).await.is_err() {
        writer.abort();
    }
    info!(subscriber = %id, total = app.subscribers.len(), "subscriber disconnected");
}

/// Vide la file de l'abonné dans le socket. S'arrête à la première écriture
/// en échec ou en timeout, ou quand le registre ferme la file.
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Message>,
    send_timeout: Duration,
    id: SubscriberId,
) {
    while let Some(msg) = rx.recv().await {
        match timeout(send_timeout, sink.send(msg)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(subscriber = %id, "write failed: {e}");
                return;
            }
            Err(_) => {
                warn!(subscriber = %id, "write timed out");
                return;
            }
        }
    }
    let _ = timeout(send_timeout, sink.close()).await;
}

async fn read_until_closed(stream: &mut SplitStream<WebSocket>, id: SubscriberId) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => {
                debug!(subscriber = %id, "close frame received");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(subscriber = %id, "read failed: {e}");
                return;
            }
        }
    }
}
