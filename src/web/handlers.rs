//! # Handlers HTTP — Os Endpoints da Aplicação
//!
//! Cada função pública neste módulo é um handler Axum, mapeado a uma
//! rota em [`super::create_router()`]. Os handlers seguem o padrão
//! **HTMX fragment** — retornam fragmentos HTML que o HTMX injeta no DOM.
//!
//! | Handler | Método | Retorno | Uso |
//! |---------|--------|---------|-----|
//! | `index` | GET | HTML completo | Página do chat + nova sessão |
//! | `chat` | POST | HTMX fragment | Turno User + Bot |
//! | `history` | GET | HTMX fragment | Transcrição da sessão |
//! | `reset_session` | POST | HTMX fragment | Encerra a sessão |
//! | `threshold_control` | GET | HTMX fragment | Slider da sessão |
//! | `set_threshold` | POST | HTMX fragment | Ajusta o threshold da sessão |
//! | `status` | GET | JSON | Forma do catálogo + faixa do threshold |

use std::time::Instant;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::{Form, Json};
use maud::html;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::AppState;
use super::templates;
use crate::core::{ChatTurn, Speaker};

/// Resposta do endpoint `/status`.
#[derive(Serialize)]
pub struct StatusResponse {
    pub intents: usize,
    pub patterns: usize,
    pub dimension: usize,
    /// Threshold inicial de cada sessão nova.
    pub default_threshold: f32,
    pub min_threshold: f32,
    pub max_threshold: f32,
    pub sessions: usize,
}

/// Campos do formulário de chat.
#[derive(Deserialize)]
pub struct ChatForm {
    /// Sessão dona do histórico (campo hidden da página).
    pub session: Uuid,
    /// Texto digitado pelo usuário.
    pub message: String,
}

#[derive(Deserialize)]
pub struct SessionParams {
    pub session: Uuid,
}

#[derive(Deserialize)]
pub struct ThresholdForm {
    /// Sessão dona do slider (campo hidden do próprio formulário).
    pub session: Uuid,
    pub threshold: f32,
}

/// Converte Maud Markup em resposta Html<String> do Axum.
fn markup_to_html(m: maud::Markup) -> Html<String> {
    Html(m.into_string())
}

/// GET `/` — Página do chat. Cada carregamento abre uma sessão nova.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let session = state.sessions.lock().create();
    tracing::debug!(%session, "Session started");
    markup_to_html(templates::full_page(
        session,
        state.threshold(session),
        &state.bounds,
        state.chatbot.catalog(),
    ))
}

/// POST `/chat` — Processa um turno e retorna o fragmento User + Bot.
///
/// ```text
/// 1. Ignora mensagens vazias
/// 2. chatbot.reply() em spawn_blocking (forward pass é CPU-bound)
/// 3. Anexa os dois turnos ao histórico da sessão
/// 4. Renderiza mensagens + linha de métricas
/// ```
///
/// Falha do encoder vira uma mensagem de erro no chat; a sessão continua.
pub async fn chat(State(state): State<AppState>, Form(form): Form<ChatForm>) -> Html<String> {
    let user_text = form.message.trim().to_string();
    if user_text.is_empty() {
        return markup_to_html(html! {});
    }

    let threshold = state.threshold(form.session);
    let chatbot = state.chatbot.clone();
    let input = user_text.clone();

    let t0 = Instant::now();
    let result = tokio::task::spawn_blocking(move || chatbot.reply(&input, threshold))
        .await
        .map_err(anyhow::Error::from)
        .and_then(|r| r);
    let elapsed_ms = t0.elapsed().as_millis() as u64;

    let user_turn = ChatTurn {
        speaker: Speaker::User,
        text: user_text,
    };

    match result {
        Ok(reply) => {
            let bot_turn = ChatTurn {
                speaker: Speaker::Bot,
                text: reply.text,
            };
            {
                let mut sessions = state.sessions.lock();
                let history = sessions.history_mut(form.session);
                history.push(user_turn.speaker, user_turn.text.clone());
                history.push(bot_turn.speaker, bot_turn.text.clone());
                tracing::debug!(
                    session = %form.session,
                    matched = reply.decision.is_matched(),
                    turns = history.len(),
                    elapsed_ms,
                    "Turn completed"
                );
            }

            let metrics_line = crate::metrics::collect_metrics()
                .summary_line(elapsed_ms, Some(reply.decision.score()));
            markup_to_html(html! {
                (templates::turn_message(&user_turn))
                (templates::turn_message(&bot_turn))
                (templates::metrics_line(&metrics_line))
            })
        }
        Err(e) => {
            tracing::error!(error = %e, session = %form.session, "Turn failed");
            state
                .sessions
                .lock()
                .history_mut(form.session)
                .push(user_turn.speaker, user_turn.text.clone());
            markup_to_html(html! {
                (templates::turn_message(&user_turn))
                (templates::error_message(&format!("Error: {}", e)))
            })
        }
    }
}

/// GET `/history?session=` — Re-renderiza a transcrição da sessão.
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
) -> Html<String> {
    let sessions = state.sessions.lock();
    match sessions.history(params.session) {
        Some(history) if !history.is_empty() => {
            markup_to_html(templates::transcript(history.turns()))
        }
        _ => markup_to_html(templates::system_message("No messages yet.")),
    }
}

/// POST `/session/reset` — Encerra a sessão e descarta o histórico.
pub async fn reset_session(
    State(state): State<AppState>,
    Form(params): Form<SessionParams>,
) -> Html<String> {
    let existed = state.sessions.lock().end(params.session);
    tracing::info!(session = %params.session, existed, "Session cleared by user");
    markup_to_html(templates::system_message("Conversation cleared."))
}

/// GET `/settings/threshold?session=` — Slider com o valor da sessão.
pub async fn threshold_control(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
) -> Html<String> {
    markup_to_html(templates::threshold_control(
        params.session,
        state.threshold(params.session),
        &state.bounds,
    ))
}

/// POST `/settings/threshold` — Ajusta o threshold da sessão (restrito à faixa).
///
/// As demais sessões mantêm os próprios valores.
pub async fn set_threshold(
    State(state): State<AppState>,
    Form(form): Form<ThresholdForm>,
) -> Html<String> {
    let value = state.set_threshold(form.session, form.threshold);
    tracing::info!(
        session = %form.session,
        requested = form.threshold,
        threshold = value,
        "Similarity threshold updated"
    );
    markup_to_html(templates::threshold_control(form.session, value, &state.bounds))
}

/// GET `/status` — Forma do catálogo e faixa do threshold em JSON.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let table = state.chatbot.table();
    Json(StatusResponse {
        intents: state.chatbot.catalog().len(),
        patterns: table.len(),
        dimension: table.dimension(),
        default_threshold: state.bounds.default,
        min_threshold: state.bounds.min,
        max_threshold: state.bounds.max,
        sessions: state.sessions.lock().len(),
    })
}

// ─── Extensões de Speaker para HTML ──────────────────────────────

impl Speaker {
    /// Classe CSS da mensagem no frontend.
    pub fn css_class(&self) -> &'static str {
        match self {
            Speaker::User => "user-message",
            Speaker::Bot => "bot-message",
        }
    }

    /// Label exibida acima da mensagem.
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "You",
            Speaker::Bot => "Bot",
        }
    }
}
