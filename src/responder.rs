//! # Seletor de Respostas
//!
//! Sorteia uniformemente uma das respostas pré-escritas do intent.
//! O gerador é um [`StdRng`] explícito: com `rng_seed` na configuração
//! (ou nos testes) a sequência de respostas é reproduzível.
//!
//! | Situação | Resposta |
//! |----------|----------|
//! | Tag com respostas | sorteio uniforme |
//! | Tag com lista vazia ou desconhecida | [`GENERIC_APOLOGY`] |
//! | `fallback` com lista vazia | [`FALLBACK_DEFAULT`] |

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::core::IntentCatalog;

/// Resposta quando o intent casado não tem respostas cadastradas.
pub const GENERIC_APOLOGY: &str = "Sorry, something went wrong.";

/// Resposta quando o próprio intent de fallback não tem respostas.
pub const FALLBACK_DEFAULT: &str = "I'm not sure I understand. Can you rephrase?";

pub struct ResponseSelector {
    catalog: Arc<IntentCatalog>,
    rng: StdRng,
}

impl ResponseSelector {
    /// `seed = None` semeia a partir da entropia do sistema.
    pub fn new(catalog: Arc<IntentCatalog>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { catalog, rng }
    }

    /// Sorteia uma resposta do intent `tag`.
    pub fn select(&mut self, tag: &str) -> String {
        self.catalog
            .get(tag)
            .and_then(|intent| intent.responses.choose(&mut self.rng))
            .cloned()
            .unwrap_or_else(|| GENERIC_APOLOGY.to_string())
    }

    /// Sorteia uma resposta do intent de fallback.
    pub fn select_fallback(&mut self) -> String {
        self.catalog
            .fallback()
            .and_then(|intent| intent.responses.choose(&mut self.rng))
            .cloned()
            .unwrap_or_else(|| FALLBACK_DEFAULT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Intent, FALLBACK_TAG};

    fn catalog() -> Arc<IntentCatalog> {
        let intents = vec![
            Intent {
                tag: "greeting".into(),
                patterns: vec!["hi".into()],
                responses: vec!["Hello!".into(), "Hi there!".into(), "Hey!".into()],
            },
            Intent {
                tag: "silent".into(),
                patterns: vec!["shh".into()],
                responses: vec![],
            },
            Intent {
                tag: FALLBACK_TAG.into(),
                patterns: vec![],
                responses: vec!["I'm not sure.".into()],
            },
        ];
        Arc::new(IntentCatalog::from_intents(intents).unwrap())
    }

    #[test]
    fn picks_one_of_the_tag_responses() {
        let mut selector = ResponseSelector::new(catalog(), Some(7));
        let options = ["Hello!", "Hi there!", "Hey!"];
        for _ in 0..20 {
            let reply = selector.select("greeting");
            assert!(options.contains(&reply.as_str()));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = ResponseSelector::new(catalog(), Some(42));
        let mut b = ResponseSelector::new(catalog(), Some(42));
        let seq_a: Vec<_> = (0..10).map(|_| a.select("greeting")).collect();
        let seq_b: Vec<_> = (0..10).map(|_| b.select("greeting")).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn eventually_uses_every_response() {
        let mut selector = ResponseSelector::new(catalog(), Some(1));
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(selector.select("greeting"));
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn empty_responses_yield_apology() {
        let mut selector = ResponseSelector::new(catalog(), Some(0));
        assert_eq!(selector.select("silent"), GENERIC_APOLOGY);
        assert_eq!(selector.select("no-such-tag"), GENERIC_APOLOGY);
    }

    #[test]
    fn fallback_uses_catalog_response() {
        let mut selector = ResponseSelector::new(catalog(), None);
        assert_eq!(selector.select_fallback(), "I'm not sure.");
    }
}
