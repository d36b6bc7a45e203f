//! # Matcher — Tabela de Embeddings dos Patterns
//!
//! A [`PatternTable`] é construída **uma única vez** na inicialização:
//! cada pattern do catálogo é embeddado (em uma forward pass de batch) e
//! guardado junto com a tag do intent dono. Depois disso a tabela é
//! imutável; cada turno só faz o embedding da mensagem do usuário.
//!
//! ```text
//! índice │ tag       │ pattern  │ embedding
//! ───────┼───────────┼──────────┼──────────────
//!   0    │ greeting  │ "hi"     │ [0.12, ...]
//!   1    │ greeting  │ "hello"  │ [0.09, ...]
//!   2    │ goodbye   │ "bye"    │ [-0.31, ...]
//! ```
//!
//! ## Argmax Estável
//!
//! [`PatternTable::best_match()`] compara a query com **todas** as linhas
//! e mantém a primeira linha de score máximo — empates são resolvidos pela
//! ordem do catálogo, então o resultado é determinístico.

use anyhow::{Context, Result};

use super::Encoder;
use crate::core::{cosine_similarity, IntentCatalog};

/// Problemas estruturais na construção da tabela.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum MatchError {
    #[error("pattern table is empty")]
    EmptyTable,
    #[error("pattern '{pattern}' has dimension {found}, expected {expected}")]
    DimensionMismatch {
        pattern: String,
        expected: usize,
        found: usize,
    },
}

/// Uma linha da tabela: pattern, tag dona e embedding pré-computado.
#[derive(Clone, Debug)]
pub struct PatternRow {
    pub tag: String,
    pub pattern: String,
    pub embedding: Vec<f32>,
}

/// Melhor linha para uma query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match<'a> {
    /// Tag do intent dono do pattern vencedor.
    pub tag: &'a str,
    /// Texto do pattern vencedor.
    pub pattern: &'a str,
    /// Cosine similarity em [-1, 1].
    pub score: f32,
    /// Índice da linha na tabela.
    pub index: usize,
}

/// Tabela imutável de embeddings dos patterns.
pub struct PatternTable {
    rows: Vec<PatternRow>,
    dimension: usize,
}

impl PatternTable {
    /// Embedda todos os patterns do catálogo (uma vez) e monta a tabela.
    ///
    /// # Erros
    ///
    /// Falha do encoder, catálogo sem patterns ou dimensões inconsistentes.
    pub fn build(catalog: &IntentCatalog, encoder: &dyn Encoder) -> Result<Self> {
        let (tags, patterns): (Vec<&str>, Vec<String>) = catalog
            .patterns()
            .map(|(tag, pattern)| (tag, pattern.to_string()))
            .unzip();

        let embeddings = encoder
            .encode_batch(&patterns)
            .context("Failed to encode catalog patterns")?;
        anyhow::ensure!(
            embeddings.len() == patterns.len(),
            "encoder returned {} embeddings for {} patterns",
            embeddings.len(),
            patterns.len()
        );

        let rows = tags
            .into_iter()
            .zip(patterns)
            .zip(embeddings)
            .map(|((tag, pattern), embedding)| PatternRow {
                tag: tag.to_string(),
                pattern,
                embedding,
            })
            .collect();

        Ok(Self::from_rows(rows)?)
    }

    /// Monta a tabela a partir de linhas já embeddadas.
    pub fn from_rows(rows: Vec<PatternRow>) -> std::result::Result<Self, MatchError> {
        let dimension = rows.first().ok_or(MatchError::EmptyTable)?.embedding.len();
        if let Some(bad) = rows.iter().find(|r| r.embedding.len() != dimension) {
            return Err(MatchError::DimensionMismatch {
                pattern: bad.pattern.clone(),
                expected: dimension,
                found: bad.embedding.len(),
            });
        }
        Ok(Self { rows, dimension })
    }

    /// Linha de maior cosine similarity com `query` (primeira em caso de empate).
    ///
    /// Uma tabela construída nunca é vazia, então sempre há um vencedor.
    /// Uma query de dimensão diferente pontua 0.0 contra todas as linhas.
    pub fn best_match(&self, query: &[f32]) -> Match<'_> {
        let mut best_index = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (index, row) in self.rows.iter().enumerate() {
            let score = cosine_similarity(query, &row.embedding);
            if score > best_score {
                best_score = score;
                best_index = index;
            }
        }

        let row = &self.rows[best_index];
        Match {
            tag: &row.tag,
            pattern: &row.pattern,
            score: best_score,
            index: best_index,
        }
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[PatternRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlu::testing::LookupEncoder;

    fn row(tag: &str, pattern: &str, embedding: &[f32]) -> PatternRow {
        PatternRow {
            tag: tag.into(),
            pattern: pattern.into(),
            embedding: embedding.to_vec(),
        }
    }

    fn greetings_catalog() -> IntentCatalog {
        IntentCatalog::from_json(
            r#"[
                {"tag": "greeting", "patterns": ["hi", "hello"], "responses": ["Hello!"]},
                {"tag": "fallback", "patterns": [], "responses": ["I'm not sure."]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn build_encodes_every_pattern_in_order() {
        let table = PatternTable::build(&greetings_catalog(), &LookupEncoder::greetings()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.dimension(), 3);
        assert_eq!(table.rows()[0].pattern, "hi");
        assert_eq!(table.rows()[1].tag, "greeting");
    }

    #[test]
    fn build_propagates_encoder_failure() {
        let encoder = LookupEncoder::new(&[("hi", &[1.0])]);
        assert!(PatternTable::build(&greetings_catalog(), &encoder).is_err());
    }

    #[test]
    fn picks_highest_score() {
        let table = PatternTable::from_rows(vec![
            row("a", "a", &[1.0, 0.0]),
            row("b", "b", &[0.0, 1.0]),
        ])
        .unwrap();
        let m = table.best_match(&[0.1, 0.9]);
        assert_eq!(m.tag, "b");
        assert_eq!(m.index, 1);
        assert!(m.score > 0.9);
    }

    #[test]
    fn ties_go_to_first_row() {
        let table = PatternTable::from_rows(vec![
            row("first", "x", &[1.0, 0.0]),
            row("second", "y", &[1.0, 0.0]),
        ])
        .unwrap();
        let m = table.best_match(&[1.0, 0.0]);
        assert_eq!(m.tag, "first");
        assert_eq!(m.index, 0);
    }

    #[test]
    fn matching_is_deterministic() {
        let table = PatternTable::build(&greetings_catalog(), &LookupEncoder::greetings()).unwrap();
        let query = [0.5, 0.5, 0.2];
        let first = table.best_match(&query);
        for _ in 0..10 {
            assert_eq!(table.best_match(&query), first);
        }
    }

    #[test]
    fn negative_scores_still_yield_a_match() {
        let table = PatternTable::from_rows(vec![row("a", "a", &[1.0, 0.0])]).unwrap();
        let m = table.best_match(&[-1.0, 0.0]);
        assert_eq!(m.tag, "a");
        assert!((m.score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_empty_and_ragged_tables() {
        assert_eq!(
            PatternTable::from_rows(Vec::new()).err(),
            Some(MatchError::EmptyTable)
        );
        let err = PatternTable::from_rows(vec![row("a", "a", &[1.0, 0.0]), row("b", "b", &[1.0])])
            .err()
            .unwrap();
        assert!(matches!(err, MatchError::DimensionMismatch { found: 1, .. }));
    }
}
