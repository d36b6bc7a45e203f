//! Similaridade cosseno entre embeddings.

/// Calcula a **similaridade cosseno** entre dois vetores.
///
/// ## Fórmula
///
/// ```text
/// cos(θ) = (A · B) / (‖A‖ × ‖B‖)
/// ```
///
/// ## Interpretação
///
/// | Valor | Significado |
/// |-------|-------------|
/// | 1.0 | Vetores idênticos (mesma direção) |
/// | 0.6 | Threshold padrão do chatbot |
/// | 0.0 | Sem relação (ortogonais) |
/// | -1.0 | Opostos (direções contrárias) |
///
/// ## Edge Cases
///
/// - Vetores de tamanhos diferentes → retorna 0.0
/// - Vetores vazios → retorna 0.0
/// - Vetor zero (norma 0) → retorna 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    // Produto escalar e normas em uma única passada
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = [0.3, -0.2, 0.9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let s = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]);
        assert!((s + 1.0).abs() < 1e-6);
    }

    #[test]
    fn magnitude_does_not_matter() {
        let s = cosine_similarity(&[1.0, 1.0], &[10.0, 10.0]);
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
