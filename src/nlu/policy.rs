//! # Política de Decisão — o Gate de Threshold
//!
//! Não é uma máquina de estados: são só dois resultados possíveis.
//!
//! | Condição | Decisão | Efeito |
//! |----------|---------|--------|
//! | `score >= threshold` | [`Decision::Matched`] | resposta do intent vencedor |
//! | `score < threshold` | [`Decision::Unmatched`] | log da mensagem + resposta de `fallback` |
//!
//! Sem histerese, sem threshold por tag. Como a comparação é `>=`, subir o
//! threshold só pode mover turnos de `Matched` para `Unmatched`.

use super::Match;

/// Resultado do gate de threshold para um turno.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    /// O melhor pattern superou o threshold.
    Matched { tag: String, score: f32 },
    /// Nenhum pattern superou o threshold; `nearest` é a tag mais próxima.
    Unmatched { nearest: String, score: f32 },
}

impl Decision {
    pub fn from_match(m: &Match<'_>, threshold: f32) -> Self {
        if m.score >= threshold {
            Decision::Matched {
                tag: m.tag.to_string(),
                score: m.score,
            }
        } else {
            Decision::Unmatched {
                nearest: m.tag.to_string(),
                score: m.score,
            }
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Decision::Matched { .. })
    }

    pub fn score(&self) -> f32 {
        match self {
            Decision::Matched { score, .. } | Decision::Unmatched { score, .. } => *score,
        }
    }
}
