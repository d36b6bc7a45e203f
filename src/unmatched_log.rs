//! # Log de Mensagens Não Reconhecidas
//!
//! Registro append-only, em CSV, das mensagens que não superaram o
//! threshold — para revisão humana posterior (ex: virar novos patterns).
//!
//! ## Formato
//!
//! ```text
//! input_text,timestamp
//! asdkjhasd,18-10-2026 14:03:27
//! "hello, is anyone there?",18-10-2026 14:05:02
//! ```
//!
//! - Cabeçalho escrito quando o arquivo não existe ou está vazio
//! - Timestamp em hora local, formato `DD-MM-YYYY HH:MM:SS`
//! - Quoting CSV padrão (vírgulas, aspas e quebras de linha sobrevivem)
//!
//! O processo nunca lê o arquivo de volta: sem rotação, sem deduplicação.
//! As escritas passam por um `Mutex` — um único escritor por vez.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Formato `strftime` do timestamp.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

const HEADER: [&str; 2] = ["input_text", "timestamp"];

/// Uma linha do log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedEntry {
    pub input_text: String,
    pub timestamp: String,
}

pub struct UnmatchedLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl UnmatchedLog {
    /// Abre o log em `path`, criando diretório e cabeçalho se necessário.
    ///
    /// # Erros
    ///
    /// Retorna erro se não conseguir criar o diretório ou o arquivo.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let log = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        log.ensure_header()?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Escreve o cabeçalho se o arquivo não existir ou estiver vazio.
    ///
    /// Chamado com `write_lock` já adquirido (ou antes do log ser compartilhado).
    fn ensure_header(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let is_empty = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        if is_empty {
            let mut writer = csv::Writer::from_path(&self.path)
                .with_context(|| format!("Failed to create {}", self.path.display()))?;
            writer.write_record(HEADER)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Anexa uma linha `(text, at)` ao log.
    ///
    /// # Erros
    ///
    /// Falha de I/O (permissões, disco cheio). O chamador decide se isso
    /// derruba o turno; o [`Chatbot`](crate::chatbot::Chatbot) apenas avisa.
    pub fn append(&self, text: &str, at: NaiveDateTime) -> Result<UnmatchedEntry> {
        let entry = UnmatchedEntry {
            input_text: text.to_string(),
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
        };

        let _guard = self.write_lock.lock();
        // O arquivo pode ter sido apagado enquanto o processo roda
        self.ensure_header()?;

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(&entry)?;
        writer.flush()?;

        Ok(entry)
    }
}
