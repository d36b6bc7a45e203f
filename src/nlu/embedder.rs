//! # Embedder MiniLM — Gerador de Representações Vetoriais
//!
//! O [`Embedder`] encapsula um sentence-transformer pré-treinado e
//! congelado — por padrão `sentence-transformers/all-MiniLM-L6-v2`
//! (BERT de 6 camadas, 384 dimensões).
//!
//! ## Pipeline de Embedding
//!
//! ```text
//! Texto → Tokenizer → Token IDs → BERT Forward Pass → Mean Pooling → L2 Normalize
//!                                                          ↓
//!                                                    Vec<f32> (384-dim)
//! ```
//!
//! ## Carregamento do Modelo
//!
//! Os arquivos são baixados do HuggingFace Hub na primeira execução e
//! cacheados em `~/.cache/huggingface/` — execuções seguintes não tocam
//! a rede. O carregamento segue uma estratégia de fallback:
//!
//! | Componente | Preferido | Fallback |
//! |-----------|-----------|----------|
//! | Tokenizer | `tokenizer.json` | `vocab.txt` (WordPiece) |
//! | Pesos | `model.safetensors` | `pytorch_model.bin` |
//! | Device | CPU | — |
//!
//! Falha no carregamento é fatal para a inicialização: não existe modo
//! degradado sem modelo.

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert;
use hf_hub::api::sync::{Api, ApiRepo};
use serde::Deserialize;
use tokenizers::{Encoding, Tokenizer, TruncationParams};

use super::Encoder;

/// Comprimento máximo de entrada em tokens quando o repositório não publica
/// `sentence_bert_config.json` (o `max_seq_length` do all-MiniLM-L6-v2).
const DEFAULT_MAX_TOKENS: usize = 256;

/// Trecho relevante de `sentence_bert_config.json`.
#[derive(Deserialize)]
struct SentenceBertConfig {
    max_seq_length: usize,
}

/// `max_seq_length` de um `sentence_bert_config.json`; `None` se ausente ou inválido.
fn parse_max_seq_length(json: &str) -> Option<usize> {
    serde_json::from_str::<SentenceBertConfig>(json)
        .ok()
        .map(|c| c.max_seq_length)
        .filter(|&n| n > 0)
}

/// Embedder sentence-transformer — gera embeddings normalizados.
///
/// Após [`Embedder::load()`] é imutável: `encode` recebe `&self` e pode ser
/// chamado de qualquer thread.
pub struct Embedder {
    /// Modelo BERT carregado — Candle `BertModel`.
    model: bert::BertModel,
    /// Tokenizer WordPiece.
    tokenizer: Tokenizer,
    /// Device de execução (CPU).
    device: Device,
}

impl Embedder {
    /// Carrega o modelo `repo_id` do HuggingFace Hub.
    ///
    /// Operação pesada (download na primeira vez, mmap dos pesos) — é
    /// chamada dentro de `spawn_blocking` no `main.rs`.
    ///
    /// # Erros
    ///
    /// Retorna erro se:
    /// - Não conseguir acessar o HuggingFace Hub e o cache estiver vazio
    /// - Os arquivos do modelo estiverem corrompidos
    pub fn load(repo_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        tracing::info!(model = repo_id, "Loading embedding model from HuggingFace Hub...");
        let api = Api::new().context("Failed to create HF Hub API")?;
        let repo = api.model(repo_id.to_string());

        let config_path = repo
            .get("config.json")
            .context("Failed to download config.json")?;
        let config: bert::Config = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .context("Failed to parse model config")?;

        let tokenizer = Self::fetch_tokenizer(&repo)?;
        let vb = Self::fetch_weights(&repo, &device)?;
        let model = bert::BertModel::load(vb, &config).context("Failed to load BERT model")?;

        tracing::info!(
            model = repo_id,
            dimension = config.hidden_size,
            "Embedding model loaded on {:?}",
            device
        );
        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// `tokenizer.json` quando publicado, senão WordPiece a partir de `vocab.txt`.
    ///
    /// Padding desligado (feito em [`Embedder::forward`]) e truncamento no
    /// `max_seq_length` do modelo.
    fn fetch_tokenizer(repo: &ApiRepo) -> Result<Tokenizer> {
        let mut tokenizer = match repo.get("tokenizer.json") {
            Ok(path) => Tokenizer::from_file(&path).map_err(|e| anyhow::anyhow!("{}", e))?,
            Err(_) => {
                tracing::info!("tokenizer.json not available, building WordPiece from vocab.txt...");
                let vocab_path = repo
                    .get("vocab.txt")
                    .context("Failed to download vocab.txt")?;
                Self::build_bert_tokenizer(
                    vocab_path
                        .to_str()
                        .context("Invalid vocab.txt path encoding")?,
                )?
            }
        };
        let max_tokens = Self::fetch_max_tokens(repo);
        tracing::info!(max_tokens, "Tokenizer ready");
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(tokenizer)
    }

    /// `max_seq_length` de `sentence_bert_config.json`, ou [`DEFAULT_MAX_TOKENS`].
    fn fetch_max_tokens(repo: &ApiRepo) -> usize {
        repo.get("sentence_bert_config.json")
            .ok()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|json| parse_max_seq_length(&json))
            .unwrap_or(DEFAULT_MAX_TOKENS)
    }

    /// Pesos via mmap de `model.safetensors`; `pytorch_model.bin` se ausente.
    fn fetch_weights(repo: &ApiRepo, device: &Device) -> Result<VarBuilder<'static>> {
        match repo.get("model.safetensors") {
            Ok(path) => {
                // SAFETY: o arquivo do cache do Hub não é alterado enquanto mapeado
                let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device) }
                    .context("Failed to load safetensors weights")?;
                Ok(vb)
            }
            Err(_) => {
                tracing::info!("model.safetensors not available, falling back to pytorch_model.bin...");
                let path = repo
                    .get("pytorch_model.bin")
                    .context("Failed to download pytorch_model.bin")?;
                VarBuilder::from_pth(&path, DType::F32, device)
                    .context("Failed to load pytorch weights")
            }
        }
    }

    /// Constrói um tokenizer WordPiece BERT a partir de `vocab.txt`.
    ///
    /// MiniLM é *uncased*, então o normalizer aplica lowercase.
    fn build_bert_tokenizer(vocab_path: &str) -> Result<Tokenizer> {
        use tokenizers::models::wordpiece::WordPiece;
        use tokenizers::normalizers::BertNormalizer;
        use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
        use tokenizers::processors::bert::BertProcessing;

        let wordpiece = WordPiece::from_file(vocab_path)
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        let mut tokenizer = Tokenizer::new(wordpiece);
        tokenizer.with_normalizer(Some(BertNormalizer::new(true, true, None, true)));
        tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
        tokenizer.with_post_processor(Some(BertProcessing::new(
            ("[SEP]".to_string(), 102),
            ("[CLS]".to_string(), 101),
        )));

        Ok(tokenizer)
    }

    fn tokenize(&self, text: &str) -> Result<Encoding> {
        self.tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenizer error: {}", e))
    }

    /// Forward pass de um batch de encodings, com padding até o maior.
    ///
    /// Tokens de padding têm id 0 e mask 0, então não entram no pooling:
    /// o vetor de um texto não depende dos outros textos do batch.
    fn forward(&self, encodings: &[Encoding]) -> Result<Vec<Vec<f32>>> {
        let batch_size = encodings.len();
        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

        let mut ids = vec![0u32; batch_size * max_len];
        let mut mask = vec![0u32; batch_size * max_len];
        for (row, enc) in encodings.iter().enumerate() {
            let offset = row * max_len;
            let len = enc.get_ids().len();
            ids[offset..offset + len].copy_from_slice(enc.get_ids());
            mask[offset..offset + len].copy_from_slice(enc.get_attention_mask());
        }

        let shape = (batch_size, max_len);
        let input_ids = Tensor::from_vec(ids, shape, &self.device)?;
        // Single segment: token type 0 em todas as posições
        let token_type_ids = Tensor::zeros(shape, DType::U32, &self.device)?;
        let attention_mask = Tensor::from_vec(mask, shape, &self.device)?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let normalized = Self::pool_and_normalize(output, &attention_mask)?;
        Ok(normalized.to_vec2()?)
    }

    /// Mean pooling ponderado pelo attention mask + normalização L2.
    ///
    /// `output` é `[batch, seq_len, hidden]`, `attention_mask` é `[batch, seq_len]`.
    /// Retorna `[batch, hidden]` com `‖v‖ = 1` por linha.
    fn pool_and_normalize(output: Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let weights = attention_mask
            .unsqueeze(2)?
            .to_dtype(DType::F32)?
            .broadcast_as(output.shape())?;

        let token_count = weights.sum(1)?.clamp(1e-9, f64::MAX)?;
        let pooled = ((output * &weights)?.sum(1)? / token_count)?;

        let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
        Ok(pooled.broadcast_div(&norm)?)
    }
}

impl Encoder for Embedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self.tokenize(text)?;
        self.forward(std::slice::from_ref(&encoding))?
            .pop()
            .context("Empty model output")
    }

    /// Todos os textos em uma única forward pass.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let encodings = texts
            .iter()
            .map(|t| self.tokenize(t))
            .collect::<Result<Vec<_>>>()?;
        self.forward(&encodings)
    }
}
