//! # Módulo NLU — Embeddings e Matching de Intents
//!
//! Pipeline por turno:
//!
//! ```text
//! texto do usuário
//!   ├── 1. normalize_input()    → NFC + trim
//!   ├── 2. Encoder::encode()    → Vec<f32> (384 dims, L2 normalizado)
//!   ├── 3. PatternTable::best_match() → (tag, score) por cosine similarity
//!   └── 4. Decision::from_match()     → Matched | Unmatched (threshold)
//! ```
//!
//! O [`Encoder`] é um trait para que o núcleo de matching possa ser
//! exercitado sem o modelo real; em produção a implementação é o
//! [`Embedder`](embedder::Embedder) (MiniLM via Candle).

pub mod embedder;
pub mod matcher;
pub mod policy;

use anyhow::Result;
use unicode_normalization::UnicodeNormalization;

pub use matcher::{Match, PatternTable};
pub use policy::Decision;

/// Converte texto em um vetor de dimensão fixa.
///
/// Implementações devem ser **determinísticas**: o mesmo texto sempre
/// produz o mesmo vetor.
pub trait Encoder: Send + Sync {
    /// Embedding de um texto único.
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding de vários textos. A implementação padrão apenas chama
    /// [`encode`](Encoder::encode) em sequência.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }
}

/// Normalização Unicode NFC + remoção de espaços nas bordas.
///
/// Garante que "é" composto e "e + ◌́" produzam o mesmo embedding.
pub fn normalize_input(text: &str) -> String {
    text.nfc().collect::<String>().trim().to_string()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_composes_and_trims() {
        let decomposed = "  cafe\u{301}\n";
        assert_eq!(normalize_input(decomposed), "café");
    }

    #[test]
    fn default_batch_encodes_each_text() {
        let enc = testing::LookupEncoder::greetings();
        let out = enc
            .encode_batch(&["hi".to_string(), "hello".to_string()])
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], vec![0.8, 0.6, 0.0]);
        assert!(enc.encode_batch(&["unknown".to_string()]).is_err());
    }
}
