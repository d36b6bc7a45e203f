//! # Catálogo de Intents
//!
//! Um [`Intent`] é uma categoria nomeada de pedido do usuário, definida
//! por frases de exemplo (*patterns*) e respostas candidatas (*responses*).
//! O [`IntentCatalog`] é carregado **uma única vez** na inicialização a
//! partir de um arquivo JSON e nunca mais muda durante a vida do processo.
//!
//! ## Formato do Arquivo
//!
//! ```json
//! [
//!   { "tag": "greeting", "patterns": ["hi", "hello"], "responses": ["Hello!"] },
//!   { "tag": "fallback", "patterns": [], "responses": ["I'm not sure."] }
//! ]
//! ```
//!
//! ## Invariantes (validadas no carregamento)
//!
//! | Regra | Erro |
//! |-------|------|
//! | Toda tag é não-vazia | [`CatalogError::EmptyTag`] |
//! | Tags são únicas | [`CatalogError::DuplicateTag`] |
//! | Existe a tag `fallback` | [`CatalogError::MissingFallback`] |
//! | `fallback` tem ≥ 1 resposta | [`CatalogError::EmptyFallback`] |
//! | Há ao menos um pattern no catálogo | [`CatalogError::NoPatterns`] |
//!
//! Qualquer violação é fatal: o servidor não chega a subir.
//! Um intent comum com `responses` vazio é **permitido** — o
//! [`ResponseSelector`](crate::responder::ResponseSelector) responde com
//! um pedido de desculpas genérico nesse caso.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tag reservada do intent usado quando nenhum pattern supera o threshold.
pub const FALLBACK_TAG: &str = "fallback";

/// Um intent do catálogo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Identificador único (ex: `"greeting"`).
    pub tag: String,
    /// Frases de exemplo, usadas como âncoras de comparação.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Respostas pré-escritas; uma é sorteada a cada match.
    #[serde(default)]
    pub responses: Vec<String>,
}

/// Violação de invariante do catálogo.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("intent #{index} has an empty tag")]
    EmptyTag { index: usize },
    #[error("duplicate intent tag '{0}'")]
    DuplicateTag(String),
    #[error("catalog has no 'fallback' intent")]
    MissingFallback,
    #[error("the 'fallback' intent must have at least one response")]
    EmptyFallback,
    #[error("catalog has no patterns to match against")]
    NoPatterns,
}

/// Coleção validada e imutável de intents.
///
/// Preserva a ordem do arquivo — a ordem dos patterns define o desempate
/// do matcher (a primeira ocorrência vence).
#[derive(Clone, Debug)]
pub struct IntentCatalog {
    intents: Vec<Intent>,
}

impl IntentCatalog {
    /// Valida e constrói o catálogo a partir de intents já desserializados.
    pub fn from_intents(intents: Vec<Intent>) -> std::result::Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (index, intent) in intents.iter().enumerate() {
            if intent.tag.trim().is_empty() {
                return Err(CatalogError::EmptyTag { index });
            }
            if !seen.insert(intent.tag.as_str()) {
                return Err(CatalogError::DuplicateTag(intent.tag.clone()));
            }
        }

        let fallback = intents
            .iter()
            .find(|i| i.tag == FALLBACK_TAG)
            .ok_or(CatalogError::MissingFallback)?;
        if fallback.responses.is_empty() {
            return Err(CatalogError::EmptyFallback);
        }

        if intents.iter().all(|i| i.patterns.is_empty()) {
            return Err(CatalogError::NoPatterns);
        }

        Ok(Self { intents })
    }

    /// Desserializa e valida um catálogo em JSON.
    ///
    /// # Erros
    ///
    /// JSON malformado ou qualquer [`CatalogError`].
    pub fn from_json(json: &str) -> Result<Self> {
        let intents: Vec<Intent> =
            serde_json::from_str(json).context("Failed to parse intents JSON")?;
        Ok(Self::from_intents(intents)?)
    }

    /// Carrega o catálogo do disco.
    ///
    /// # Erros
    ///
    /// Arquivo ausente/ilegível, JSON malformado ou catálogo inválido.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read intents file {}", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("Invalid intents file {}", path.display()))
    }

    /// Busca um intent pela tag.
    pub fn get(&self, tag: &str) -> Option<&Intent> {
        self.intents.iter().find(|i| i.tag == tag)
    }

    /// Intent de fallback — sempre presente num catálogo validado.
    pub fn fallback(&self) -> Option<&Intent> {
        self.get(FALLBACK_TAG)
    }

    /// Itera `(tag, pattern)` na ordem do catálogo.
    pub fn patterns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.intents.iter().flat_map(|intent| {
            intent
                .patterns
                .iter()
                .map(move |p| (intent.tag.as_str(), p.as_str()))
        })
    }

    /// Número total de patterns (linhas da tabela de embeddings).
    pub fn pattern_count(&self) -> usize {
        self.intents.iter().map(|i| i.patterns.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(tag: &str, patterns: &[&str], responses: &[&str]) -> Intent {
        Intent {
            tag: tag.to_string(),
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            responses: responses.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn parses_valid_catalog() {
        let json = r#"[
            {"tag": "greeting", "patterns": ["hi", "hello"], "responses": ["Hello!"]},
            {"tag": "fallback", "patterns": [], "responses": ["I'm not sure."]}
        ]"#;
        let catalog = IntentCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.pattern_count(), 2);
        assert_eq!(catalog.fallback().unwrap().responses, vec!["I'm not sure."]);
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let json = r#"[
            {"tag": "greeting", "patterns": ["hi"]},
            {"tag": "fallback", "responses": ["?"]}
        ]"#;
        let catalog = IntentCatalog::from_json(json).unwrap();
        assert!(catalog.get("greeting").unwrap().responses.is_empty());
        assert!(catalog.fallback().unwrap().patterns.is_empty());
    }

    #[test]
    fn patterns_keep_catalog_order() {
        let catalog = IntentCatalog::from_intents(vec![
            intent("a", &["a1", "a2"], &["x"]),
            intent("b", &["b1"], &["y"]),
            intent(FALLBACK_TAG, &[], &["z"]),
        ])
        .unwrap();
        let pairs: Vec<_> = catalog.patterns().collect();
        assert_eq!(pairs, vec![("a", "a1"), ("a", "a2"), ("b", "b1")]);
    }

    #[test]
    fn rejects_empty_tag() {
        let err = IntentCatalog::from_intents(vec![
            intent("  ", &["hi"], &["x"]),
            intent(FALLBACK_TAG, &[], &["z"]),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::EmptyTag { index: 0 });
    }

    #[test]
    fn rejects_duplicate_tag() {
        let err = IntentCatalog::from_intents(vec![
            intent("greeting", &["hi"], &["x"]),
            intent("greeting", &["hello"], &["y"]),
            intent(FALLBACK_TAG, &[], &["z"]),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateTag("greeting".into()));
    }

    #[test]
    fn rejects_missing_or_empty_fallback() {
        let missing =
            IntentCatalog::from_intents(vec![intent("greeting", &["hi"], &["x"])]).unwrap_err();
        assert_eq!(missing, CatalogError::MissingFallback);

        let empty = IntentCatalog::from_intents(vec![
            intent("greeting", &["hi"], &["x"]),
            intent(FALLBACK_TAG, &[], &[]),
        ])
        .unwrap_err();
        assert_eq!(empty, CatalogError::EmptyFallback);
    }

    #[test]
    fn rejects_catalog_without_patterns() {
        let err = IntentCatalog::from_intents(vec![intent(FALLBACK_TAG, &[], &["z"])])
            .unwrap_err();
        assert_eq!(err, CatalogError::NoPatterns);
    }

    #[test]
    fn allows_intent_with_empty_responses() {
        let catalog = IntentCatalog::from_intents(vec![
            intent("silent", &["shh"], &[]),
            intent(FALLBACK_TAG, &[], &["z"]),
        ]);
        assert!(catalog.is_ok());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(IntentCatalog::from_json("{ not json").is_err());
        assert!(IntentCatalog::from_json(r#"[{"patterns": []}]"#).is_err());
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intents.json");
        std::fs::write(
            &path,
            r#"[{"tag":"hi","patterns":["hi"],"responses":["yo"]},
                {"tag":"fallback","responses":["?"]}]"#,
        )
        .unwrap();
        let catalog = IntentCatalog::load(&path).unwrap();
        assert_eq!(catalog.get("hi").unwrap().responses, vec!["yo"]);

        assert!(IntentCatalog::load(&dir.path().join("missing.json")).is_err());
    }
}
