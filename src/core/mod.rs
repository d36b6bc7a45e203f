//! # Módulo Core — Tipos Fundamentais do Domínio
//!
//! Este módulo agrupa os tipos sobre os quais todo o chatbot é construído:
//!
//! - [`Intent`] — categoria nomeada de pedido do usuário (tag + patterns + responses)
//! - [`IntentCatalog`] — coleção validada de intents, carregada uma única vez
//! - [`ChatTurn`] / [`ChatHistory`] — transcrição ordenada de uma sessão
//! - [`SessionStore`] — sessões ativas, cada uma dona do seu histórico
//! - [`cosine_similarity`] — métrica usada pelo matcher
//!
//! ## Propriedade dos Dados
//!
//! ```text
//! Processo (imutável após init)      Sessão (mutável, escopo local)
//! ┌────────────────────────┐         ┌──────────────────────┐
//! │ Arc<IntentCatalog>     │         │ ChatHistory          │
//! │ PatternTable           │         │  ├── User: "oi"      │
//! └────────────────────────┘         │  └── Bot:  "Olá!"    │
//!                                    └──────────────────────┘
//! ```

/// Sub-módulo com [`Intent`], [`IntentCatalog`] e a validação do catálogo.
pub mod intent;

/// Sub-módulo com o histórico de chat e o armazenamento de sessões.
pub mod session;

/// Sub-módulo com a similaridade cosseno.
pub mod similarity;

// Re-exports para conveniência — permite usar `crate::core::IntentCatalog` diretamente.
pub use intent::{CatalogError, Intent, IntentCatalog, FALLBACK_TAG};
pub use session::{ChatTurn, SessionStore, Speaker};
pub use similarity::cosine_similarity;
