//! Static page serving for the chat client
//!
//! Stateless collaborator of the chat core: serves the chat page (with the
//! websocket port substituted in) and the notification sound. Both are read
//! from disk per request, like the rest of the deployment's static assets.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use tracing::{error, info};

use crate::error::Result;
use crate::ChatConfig;

#[derive(Clone)]
struct Pages {
    websocket_port: u16,
}

/// Serve the chat page until the listener fails.
pub async fn serve(config: ChatConfig) -> Result<()> {
    let app = Router::new()
        .route("/", get(index))
        .route("/chime.wav", get(chime))
        .with_state(Pages {
            websocket_port: config.websocket_port,
        });

    let addr = SocketAddr::new(config.interface, config.http_port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Serving the chat page on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn index(State(pages): State<Pages>) -> impl IntoResponse {
    match tokio::fs::read_to_string("chat.html").await {
        Ok(page) => Html(page.replace(
            "{{ websocket_port }}",
            &pages.websocket_port.to_string(),
        ))
        .into_response(),
        Err(e) => {
            error!("Failed to read chat.html: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn chime() -> impl IntoResponse {
    match tokio::fs::read("chime.wav").await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "audio/wav")], bytes).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}
