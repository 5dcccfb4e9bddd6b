//! Dashboard y stream de eventos
//!
//! `/ws` acepta el token por query (`?token=`) porque los navegadores no
//! pueden fijar headers en el handshake.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use crate::controllers::dashboard_controller::DashboardController;
use crate::models::DashboardStats;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_stream_router() -> Router<AppState> {
    Router::new()
        .route("/api/stats", get(dashboard_stats))
        .route("/ws", get(stream_events))
}

async fn dashboard_stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    Ok(Json(DashboardController::new(&state).stats().await?))
}

async fn stream_events(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| pump_events(socket, state))
}

/// Reenvía los frames del hub al socket hasta que uno de los dos lados cierre
async fn pump_events(socket: WebSocket, state: AppState) {
    let mut subscription = match DashboardController::new(&state).subscribe().await {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!("⚠️ No se pudo registrar el observador: {}", e);
            return;
        }
    };
    let observer_id = subscription.id;
    info!(
        "🔌 Observador {} conectado ({} activos)",
        observer_id,
        state.hub.observer_count()
    );

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            frame = subscription.receiver.recv() => match frame {
                Some(frame) => {
                    if sender.send(Message::Text(frame.to_string())).await.is_err() {
                        break;
                    }
                }
                // Hub cerrado o observador descartado por atasco
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.hub.unregister(observer_id);
    let _ = sender.send(Message::Close(None)).await;
    info!("🔌 Observador {} desconectado", observer_id);
}
