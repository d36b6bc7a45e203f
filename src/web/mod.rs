//! # Módulo Web — A Interface do Chat
//!
//! Camada web construída com **Axum** + **HTMX** + **Maud**.
//!
//! ## Rotas
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Browser (HTMX)                                           │
//! ├──────────────────────────────────────────────────────────┤
//! │  GET  /                    → página do chat (nova sessão)│
//! │  POST /chat                → HTMX fragment (User + Bot)  │
//! │  GET  /history?session=    → HTMX fragment (transcrição) │
//! │  POST /session/reset       → HTMX fragment (fim sessão)  │
//! │  GET  /settings/threshold  → HTMX fragment (slider)      │
//! │  POST /settings/threshold  → HTMX fragment (slider)      │
//! │  GET  /status              → JSON                        │
//! ├──────────────────────────────────────────────────────────┤
//! │ Static Assets (tower_http::ServeDir → /assets/)          │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod state;
pub mod templates;

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use state::AppState;

/// Cria o router Axum com todas as rotas da aplicação.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // ── Página HTML ───────────────────────────────────────
        .route("/", get(handlers::index))
        // ── API JSON ──────────────────────────────────────────
        .route("/status", get(handlers::status))
        // ── HTMX fragments ───────────────────────────────────
        .route("/chat", post(handlers::chat))
        .route("/history", get(handlers::history))
        .route("/session/reset", post(handlers::reset_session))
        .route(
            "/settings/threshold",
            get(handlers::threshold_control).post(handlers::set_threshold),
        )
        // ── Arquivos estáticos ────────────────────────────────
        .nest_service("/assets", ServeDir::new("assets"))
        .with_state(state)
}
