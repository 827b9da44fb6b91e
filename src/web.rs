use std::path::Path;

use axum::{
    body::Bytes,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::debug;

use crate::protocol::{self, JsonResponse};
use crate::service::Handle;

/// HTTP front end: `POST /query` for single requests, `GET /ws` for a
/// WebSocket carrying one JSON request per text message, and optionally a
/// static client served from `static_dir`.
pub fn create_router(handle: Handle, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/query", post(query_handler))
        .route("/ws", get(ws_handler))
        .with_state(handle);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

async fn query_handler(State(handle): State<Handle>, body: Bytes) -> impl IntoResponse {
    let response = handle.request(&body).await;
    (status_of(&response), Json(response))
}

fn status_of(response: &JsonResponse) -> StatusCode {
    match response {
        JsonResponse::Ok { .. } => StatusCode::OK,
        JsonResponse::Error { kind, .. } => match *kind {
            "not_found" => StatusCode::NOT_FOUND,
            "duplicate_name" => StatusCode::CONFLICT,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            "internal" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        },
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(handle): State<Handle>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, handle))
}

async fn handle_socket(mut socket: WebSocket, handle: Handle) {
    while let Some(Ok(msg)) = socket.recv().await {
        let Message::Text(text) = msg else {
            continue;
        };
        debug!(bytes = text.len(), "websocket request");

        let response = handle.request(text.as_bytes()).await;
        let json = String::from_utf8_lossy(&protocol::encode_response(&response)).into_owned();
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}
