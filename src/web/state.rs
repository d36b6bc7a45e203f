//! # Estado da Aplicação Web
//!
//! ```text
//! AppState (clonado por handler — só Arcs)
//!  ├── chatbot    Arc<Chatbot>             imutável após init
//!  ├── bounds     ThresholdSettings        faixa do slider (imutável)
//!  └── sessions   Arc<Mutex<SessionStore>> histórico + threshold por sessão
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::chatbot::Chatbot;
use crate::config::ThresholdSettings;
use crate::core::SessionStore;

/// Estado compartilhado da aplicação Axum.
#[derive(Clone)]
pub struct AppState {
    /// Catálogo + tabela de embeddings + encoder, prontos antes do bind.
    pub chatbot: Arc<Chatbot>,
    /// Faixa permitida para o threshold; `bounds.default` inicia cada sessão.
    pub bounds: ThresholdSettings,
    /// Históricos e thresholds por sessão.
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    pub fn new(chatbot: Arc<Chatbot>, bounds: ThresholdSettings, session_ttl: Duration) -> Self {
        Self {
            chatbot,
            bounds,
            sessions: Arc::new(Mutex::new(SessionStore::new(session_ttl, bounds.default))),
        }
    }

    pub fn threshold(&self, session: Uuid) -> f32 {
        self.sessions.lock().threshold(session)
    }

    /// Ajusta o threshold da sessão (restrito à faixa) e retorna o valor efetivo.
    pub fn set_threshold(&self, session: Uuid, requested: f32) -> f32 {
        let value = self.bounds.clamp(requested);
        self.sessions.lock().set_threshold(session, value);
        value
    }
}
