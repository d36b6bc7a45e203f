//! # Configuração
//!
//! Lida de um arquivo TOML (`config.toml` no diretório atual, ou o caminho
//! em `INTENT_CHAT_CONFIG`). Todas as chaves têm default — um arquivo
//! ausente equivale à configuração padrão.
//!
//! ```toml
//! bind_addr = "0.0.0.0:3000"
//! intents_path = "intents.json"
//! unmatched_log_path = "data/unrecognized_log.csv"
//! model_id = "sentence-transformers/all-MiniLM-L6-v2"
//! session_ttl_secs = 3600
//! # rng_seed = 42
//!
//! [threshold]
//! default = 0.6
//! min = 0.4
//! max = 0.9
//! step = 0.01
//! ```

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Variável de ambiente que sobrescreve o caminho do arquivo de configuração.
pub const CONFIG_ENV_VAR: &str = "INTENT_CHAT_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Endereço TCP do servidor web.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Catálogo de intents (JSON).
    #[serde(default = "default_intents_path")]
    pub intents_path: PathBuf,
    /// CSV de mensagens não reconhecidas.
    #[serde(default = "default_unmatched_log_path")]
    pub unmatched_log_path: PathBuf,
    /// Repositório do sentence-transformer no HuggingFace Hub.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Limites e valor inicial do threshold de similaridade.
    #[serde(default)]
    pub threshold: ThresholdSettings,
    /// Semente do sorteio de respostas; `None` usa entropia do sistema.
    #[serde(default)]
    pub rng_seed: Option<u64>,
    /// Sessões inativas por mais tempo que isto são descartadas.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            intents_path: default_intents_path(),
            unmatched_log_path: default_unmatched_log_path(),
            model_id: default_model_id(),
            threshold: ThresholdSettings::default(),
            rng_seed: None,
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_intents_path() -> PathBuf {
    PathBuf::from("intents.json")
}

fn default_unmatched_log_path() -> PathBuf {
    PathBuf::from("data/unrecognized_log.csv")
}

fn default_model_id() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

const fn default_session_ttl_secs() -> u64 {
    3600
}

/// Faixa ajustável do threshold (o slider da interface).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSettings {
    #[serde(default = "default_threshold")]
    pub default: f32,
    #[serde(default = "default_threshold_min")]
    pub min: f32,
    #[serde(default = "default_threshold_max")]
    pub max: f32,
    #[serde(default = "default_threshold_step")]
    pub step: f32,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            default: default_threshold(),
            min: default_threshold_min(),
            max: default_threshold_max(),
            step: default_threshold_step(),
        }
    }
}

const fn default_threshold() -> f32 {
    0.6
}

const fn default_threshold_min() -> f32 {
    0.4
}

const fn default_threshold_max() -> f32 {
    0.9
}

const fn default_threshold_step() -> f32 {
    0.01
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("threshold bounds [{min}, {max}] must lie within [0, 1] with min <= max")]
    BoundsOutOfRange { min: f32, max: f32 },
    #[error("default threshold {default} is outside [{min}, {max}]")]
    DefaultOutOfRange { default: f32, min: f32, max: f32 },
    #[error("threshold step must be positive, got {0}")]
    InvalidStep(f32),
    #[error("session_ttl_secs must be positive")]
    ZeroSessionTtl,
}

impl ThresholdSettings {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !in_unit(self.min) || !in_unit(self.max) || self.min > self.max {
            return Err(ConfigError::BoundsOutOfRange {
                min: self.min,
                max: self.max,
            });
        }
        if !(self.min..=self.max).contains(&self.default) {
            return Err(ConfigError::DefaultOutOfRange {
                default: self.default,
                min: self.min,
                max: self.max,
            });
        }
        if !(self.step > 0.0) {
            return Err(ConfigError::InvalidStep(self.step));
        }
        Ok(())
    }

    /// Restringe um valor pedido à faixa; `NaN` volta ao default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.threshold.validate()?;
        if self.session_ttl_secs == 0 {
            return Err(ConfigError::ZeroSessionTtl);
        }
        Ok(())
    }
}

/// Caminho do arquivo de configuração: `INTENT_CHAT_CONFIG` ou `config.toml`.
pub fn config_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Carrega e valida a configuração; arquivo ausente → defaults.
///
/// # Erros
///
/// TOML malformado ou valores fora da faixa.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    let config: AppConfig = if path.exists() {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?
    } else {
        tracing::info!(path = %path.display(), "No config file found, using defaults");
        AppConfig::default()
    };
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
        assert_eq!(cfg.threshold.default, 0.6);
        assert_eq!(cfg.model_id, "sentence-transformers/all-MiniLM-L6-v2");
        assert!(cfg.rng_seed.is_none());
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "intents_path = \"custom.json\"\nrng_seed = 9\n\n[threshold]\ndefault = 0.75\n",
        )
        .unwrap();
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.intents_path, PathBuf::from("custom.json"));
        assert_eq!(cfg.rng_seed, Some(9));
        assert_eq!(cfg.threshold.default, 0.75);
        assert_eq!(cfg.threshold.min, 0.4);
        assert_eq!(cfg.session_ttl_secs, 3600);
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[threshold]\ndefault = 0.95\n").unwrap();
        assert!(load_from(&path).is_err());

        let bad = ThresholdSettings {
            min: 0.5,
            max: 1.5,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(ConfigError::BoundsOutOfRange { .. })));

        let bad_step = ThresholdSettings {
            step: 0.0,
            ..Default::default()
        };
        assert_eq!(bad_step.validate(), Err(ConfigError::InvalidStep(0.0)));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "bind_addr = [").unwrap();
        assert!(load_from(&path).is_err());
    }

    #[test]
    fn clamp_keeps_values_in_range() {
        let t = ThresholdSettings::default();
        assert_eq!(t.clamp(0.1), 0.4);
        assert_eq!(t.clamp(0.99), 0.9);
        assert_eq!(t.clamp(0.55), 0.55);
        assert_eq!(t.clamp(f32::NAN), 0.6);
    }
}
