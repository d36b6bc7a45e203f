//! # Chatbot — Um Turno Completo de Conversa
//!
//! O [`Chatbot`] amarra encoder, tabela de patterns, política de
//! threshold, seletor de respostas e log de não reconhecidas.
//!
//! ## Ciclo de um Turno
//!
//! ```text
//! mensagem do usuário
//!   ├── 1. normalize_input()            NFC + trim
//!   ├── 2. encoder.encode()             Vec<f32>
//!   ├── 3. table.best_match()           (tag, score)
//!   ├── 4. Decision::from_match()       threshold gate
//!   │     ├── Matched   → selector.select(tag)
//!   │     └── Unmatched → log.append() + selector.select_fallback()
//!   └── Reply { text, decision }
//! ```
//!
//! ## Concorrência
//!
//! Catálogo, tabela e encoder são imutáveis após [`Chatbot::new()`]. O
//! seletor (dono do RNG) fica atrás de um `Mutex` que é mantido durante
//! todo o turno: um turno termina por completo antes do próximo começar.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use parking_lot::Mutex;

use crate::core::IntentCatalog;
use crate::nlu::{normalize_input, Decision, Encoder, PatternTable};
use crate::responder::ResponseSelector;
use crate::unmatched_log::UnmatchedLog;

/// Resposta de um turno.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    /// Texto a exibir para o usuário.
    pub text: String,
    /// Como o turno foi decidido (tag e score).
    pub decision: Decision,
    /// `true` se a mensagem foi gravada no log de não reconhecidas.
    pub logged: bool,
}

pub struct Chatbot {
    catalog: Arc<IntentCatalog>,
    encoder: Arc<dyn Encoder>,
    table: PatternTable,
    selector: Mutex<ResponseSelector>,
    unmatched: UnmatchedLog,
}

impl Chatbot {
    /// Embedda os patterns do catálogo (uma única vez) e monta o chatbot.
    ///
    /// # Erros
    ///
    /// Retorna erro se o encoder falhar em algum pattern.
    pub fn new(
        catalog: Arc<IntentCatalog>,
        encoder: Arc<dyn Encoder>,
        unmatched: UnmatchedLog,
        rng_seed: Option<u64>,
    ) -> Result<Self> {
        let table = PatternTable::build(&catalog, encoder.as_ref())?;
        tracing::info!(
            patterns = table.len(),
            dimension = table.dimension(),
            "Pattern embeddings ready"
        );
        let selector = Mutex::new(ResponseSelector::new(catalog.clone(), rng_seed));
        Ok(Self {
            catalog,
            encoder,
            table,
            selector,
            unmatched,
        })
    }

    /// Processa uma mensagem do usuário com o `threshold` atual.
    ///
    /// Falha de escrita no log **não** derruba o turno: é registrada com
    /// `warn!` e a resposta de fallback é devolvida normalmente.
    ///
    /// # Erros
    ///
    /// Apenas falha do encoder — o chamador exibe como erro do turno.
    pub fn reply(&self, input: &str, threshold: f32) -> Result<Reply> {
        let mut selector = self.selector.lock();

        let text = normalize_input(input);
        let query = self
            .encoder
            .encode(&text)
            .context("Failed to encode message")?;
        let best = self.table.best_match(&query);
        let decision = Decision::from_match(&best, threshold);

        match &decision {
            Decision::Matched { tag, score } => {
                tracing::debug!(
                    tag = %tag,
                    pattern = best.pattern,
                    row = best.index,
                    score,
                    threshold,
                    "Intent matched"
                );
                Ok(Reply {
                    text: selector.select(tag),
                    decision,
                    logged: false,
                })
            }
            Decision::Unmatched { nearest, score } => {
                tracing::info!(nearest = %nearest, score, threshold, "Message below threshold");
                let logged = match self.unmatched.append(input, Local::now().naive_local()) {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::warn!(error = %e, path = %self.unmatched.path().display(), "Failed to log unmatched message");
                        false
                    }
                };
                Ok(Reply {
                    text: selector.select_fallback(),
                    decision,
                    logged,
                })
            }
        }
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }
}
