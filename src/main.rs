#![allow(rustdoc::broken_intra_doc_links)]
//! # Smart Chatbot — Intent Matching por Embeddings
//!
//! **Ponto de entrada principal** da aplicação.
//!
//! O chatbot compara cada mensagem do usuário com frases de exemplo de um
//! catálogo fixo de intents, usando similaridade de sentence embeddings, e
//! responde com uma resposta pré-escrita — ou com o fallback, quando nada
//! supera o threshold.
//!
//! ## Fluxo de Inicialização
//!
//! ```text
//! main()
//!   ├── Configura tracing/logging
//!   ├── Carrega config.toml (ou defaults)
//!   ├── Carrega e valida intents.json        ← falha = fatal
//!   ├── Abre o CSV de não reconhecidas (cabeçalho)
//!   ├── spawn_blocking:
//!   │     ├── Carrega MiniLM via HuggingFace Hub ← falha = fatal
//!   │     └── Embedda todos os patterns (uma vez)
//!   ├── Monta AppState e Router
//!   └── Inicia servidor TCP
//! ```
//!
//! Ao contrário de um carregamento em background, nada é servido antes do
//! modelo estar pronto: sem modelo não existe modo degradado.
//!
//! ## Exemplo de Uso
//!
//! ```bash
//! # Executar com logs padrão (info)
//! cargo run
//!
//! # Executar com logs detalhados (score de cada turno)
//! RUST_LOG=debug cargo run
//!
//! # Outro arquivo de configuração
//! INTENT_CHAT_CONFIG=/etc/chatbot.toml cargo run
//! ```

/// Módulo `chatbot` — um turno completo: encode → match → threshold → resposta.
mod chatbot;

/// Módulo `config` — configuração TOML com defaults.
mod config;

/// Módulo `core` — intents, catálogo, sessões, similaridade.
mod core;

/// Módulo `metrics` — linha de métricas exibida após cada turno.
mod metrics;

/// Módulo `nlu` — encoder, tabela de patterns, política de threshold.
mod nlu;

/// Módulo `responder` — sorteio de respostas com RNG semeável.
mod responder;

/// Módulo `unmatched_log` — CSV append-only de mensagens não reconhecidas.
mod unmatched_log;

/// Módulo `web` — servidor axum, handlers HTTP e templates.
mod web;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::chatbot::Chatbot;
use crate::core::IntentCatalog;
use crate::nlu::embedder::Embedder;
use crate::unmatched_log::UnmatchedLog;
use crate::web::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controla o nível; padrão info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("💬 Smart Chatbot — Starting...");

    if let Err(e) = run().await {
        tracing::error!(error = format!("{:#}", e), "Startup failed");
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config_path = config::config_path();
    let cfg = config::load_from(&config_path)?;

    let catalog = Arc::new(IntentCatalog::load(&cfg.intents_path)?);
    tracing::info!(
        intents = catalog.len(),
        patterns = catalog.pattern_count(),
        path = %cfg.intents_path.display(),
        "Intent catalog loaded"
    );

    let unmatched = UnmatchedLog::open(&cfg.unmatched_log_path)?;
    tracing::info!(path = %unmatched.path().display(), "Unmatched-input log ready");

    // Modelo + embeddings dos patterns: CPU-bound, fora do runtime async
    let model_id = cfg.model_id.clone();
    let rng_seed = cfg.rng_seed;
    let chatbot = tokio::task::spawn_blocking(move || -> Result<Chatbot> {
        let embedder = Embedder::load(&model_id)?;
        Chatbot::new(catalog, Arc::new(embedder), unmatched, rng_seed)
    })
    .await
    .context("Model loading task panicked")??;

    let state = AppState::new(
        Arc::new(chatbot),
        cfg.threshold,
        Duration::from_secs(cfg.session_ttl_secs),
    );
    let app = web::create_router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.bind_addr))?;
    tracing::info!(
        addr = %cfg.bind_addr,
        threshold = cfg.threshold.default,
        "✅ Server running"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
