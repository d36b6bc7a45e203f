//! # Sessões e Histórico de Chat
//!
//! Cada visita à página principal abre uma **sessão** com identificador
//! próprio. A sessão é dona exclusiva do seu [`ChatHistory`] e do seu
//! threshold de similaridade: mover o slider numa aba não altera as
//! decisões de outra. Os turnos são apenas anexados, nunca alterados, e o
//! histórico é descartado quando a sessão termina (reset explícito ou
//! expiração por inatividade).
//!
//! ```text
//! GET /                    → SessionStore::create()      → nova sessão vazia
//! POST /chat               → history_mut(id).push(...)   → User + Bot
//! POST /settings/threshold → set_threshold(id, v)        → só esta sessão
//! POST /session/reset      → end(id)                     → histórico descartado
//! (inatividade > ttl)      → prune_idle()                → sessão removida
//! ```
//!
//! A poda roda sempre que uma sessão é criada ou tocada, então ids
//! desconhecidos vindos de `POST` não fazem o mapa crescer sem limite.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

/// Autor de um turno do chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

/// Um turno imutável da conversa.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
}

/// Transcrição ordenada de uma sessão (append-only).
#[derive(Clone, Debug, Default)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.turns.push(ChatTurn {
            speaker,
            text: text.into(),
        });
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

struct Session {
    history: ChatHistory,
    threshold: f32,
    last_seen: Instant,
}

/// Sessões ativas indexadas por UUID.
///
/// Vive atrás de um `Mutex` no [`AppState`](crate::web::state::AppState);
/// nenhuma sessão enxerga o histórico ou o threshold de outra.
pub struct SessionStore {
    sessions: HashMap<Uuid, Session>,
    ttl: Duration,
    default_threshold: f32,
}

impl SessionStore {
    /// `default_threshold` é o valor inicial do slider de cada sessão nova.
    pub fn new(ttl: Duration, default_threshold: f32) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
            default_threshold,
        }
    }

    /// Abre uma nova sessão vazia, podando as inativas antes.
    pub fn create(&mut self) -> Uuid {
        let id = Uuid::new_v4();
        self.touch(id);
        id
    }

    /// Sessão `id`, criada vazia se desconhecida (expirada ou servidor
    /// reiniciado). Poda as inativas e renova o `last_seen`.
    fn touch(&mut self, id: Uuid) -> &mut Session {
        let now = Instant::now();
        let pruned = self.prune_idle(now);
        if pruned > 0 {
            tracing::debug!(pruned, "Expired idle sessions");
        }
        let default_threshold = self.default_threshold;
        let session = self.sessions.entry(id).or_insert_with(|| Session {
            history: ChatHistory::new(),
            threshold: default_threshold,
            last_seen: now,
        });
        session.last_seen = now;
        session
    }

    /// Histórico mutável da sessão `id`; um id desconhecido começa uma
    /// transcrição vazia sob o mesmo id.
    pub fn history_mut(&mut self, id: Uuid) -> &mut ChatHistory {
        &mut self.touch(id).history
    }

    pub fn history(&self, id: Uuid) -> Option<&ChatHistory> {
        self.sessions.get(&id).map(|s| &s.history)
    }

    /// Threshold da sessão; o default para ids desconhecidos.
    pub fn threshold(&self, id: Uuid) -> f32 {
        self.sessions
            .get(&id)
            .map_or(self.default_threshold, |s| s.threshold)
    }

    /// Ajusta o threshold apenas da sessão `id`. O valor já chega restrito
    /// à faixa configurada.
    pub fn set_threshold(&mut self, id: Uuid, value: f32) {
        self.touch(id).threshold = value;
    }

    /// Encerra a sessão, descartando o histórico. Retorna `false` se não existia.
    pub fn end(&mut self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Remove sessões sem atividade há mais de `ttl`. Retorna quantas saíram.
    pub fn prune_idle(&mut self, now: Instant) -> usize {
        let before = self.sessions.len();
        let ttl = self.ttl;
        self.sessions
            .retain(|_, s| now.saturating_duration_since(s.last_seen) <= ttl);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_preserves_order() {
        let mut h = ChatHistory::new();
        h.push(Speaker::User, "hi");
        h.push(Speaker::Bot, "Hello!");
        assert_eq!(h.len(), 2);
        assert_eq!(h.turns()[0].speaker, Speaker::User);
        assert_eq!(h.turns()[1].text, "Hello!");
    }

    #[test]
    fn sessions_are_isolated() {
        let mut store = SessionStore::new(Duration::from_secs(60), 0.6);
        let a = store.create();
        let b = store.create();
        store.history_mut(a).push(Speaker::User, "only in a");
        assert_eq!(store.history(a).unwrap().len(), 1);
        assert!(store.history(b).unwrap().is_empty());
    }

    #[test]
    fn unknown_session_starts_empty_history() {
        let mut store = SessionStore::new(Duration::from_secs(60), 0.6);
        let id = Uuid::new_v4();
        assert!(store.history(id).is_none());
        store.history_mut(id).push(Speaker::User, "hello");
        assert_eq!(store.history(id).unwrap().len(), 1);
    }

    #[test]
    fn end_discards_history() {
        let mut store = SessionStore::new(Duration::from_secs(60), 0.6);
        let id = store.create();
        store.history_mut(id).push(Speaker::User, "hello");
        assert!(store.end(id));
        assert!(store.history(id).is_none());
        assert!(!store.end(id));
    }

    #[test]
    fn prune_removes_only_idle_sessions() {
        let mut store = SessionStore::new(Duration::from_secs(10), 0.6);
        let _old = store.create();
        assert_eq!(store.prune_idle(Instant::now()), 0);
        let later = Instant::now() + Duration::from_secs(11);
        assert_eq!(store.prune_idle(later), 1);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn thresholds_are_per_session() {
        let mut store = SessionStore::new(Duration::from_secs(60), 0.6);
        let a = store.create();
        let b = store.create();
        store.set_threshold(a, 0.9);
        assert_eq!(store.threshold(a), 0.9);
        assert_eq!(store.threshold(b), 0.6);
        assert_eq!(store.threshold(Uuid::new_v4()), 0.6);
    }

    #[test]
    fn posting_to_unknown_ids_prunes_idle_sessions() {
        let mut store = SessionStore::new(Duration::ZERO, 0.6);
        for _ in 0..5 {
            store.history_mut(Uuid::new_v4()).push(Speaker::User, "hi");
            std::thread::sleep(Duration::from_millis(2));
        }
        // Com ttl zero, cada toque descarta as sessões anteriores
        assert_eq!(store.len(), 1);
    }
}
