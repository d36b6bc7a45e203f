//! # Métricas por Turno
//!
//! Linha exibida no chat após cada resposta: tempo do turno, score do
//! melhor pattern e memória do processo.
//!
//! ```text
//! ⚡ 14ms | score 0.873 | RAM 212.4 MB / 15953.1 MB
//! ```
//!
//! ## Estado Persistente (System singleton)
//!
//! Mantemos uma única instância [`System`] da lib `sysinfo` via
//! [`OnceLock`] + [`Mutex`], reutilizada em todas as coletas.

use std::sync::OnceLock;

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

static SYS: OnceLock<Mutex<System>> = OnceLock::new();

fn system() -> &'static Mutex<System> {
    SYS.get_or_init(|| Mutex::new(System::new()))
}

/// Snapshot de memória do processo.
#[derive(Clone, Debug)]
pub struct ProcessMetrics {
    /// Memória RSS do processo em MB.
    pub memory_used_mb: f64,
    /// Memória total do sistema em MB.
    pub memory_total_mb: f64,
}

/// Coleta um snapshot de memória do processo atual.
pub fn collect_metrics() -> ProcessMetrics {
    let pid = Pid::from_u32(std::process::id());

    let mut sys = system().lock();
    sys.refresh_memory();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), false);

    let memory_used_mb = sys
        .process(pid)
        .map(|p| p.memory() as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0);
    let memory_total_mb = sys.total_memory() as f64 / (1024.0 * 1024.0);

    ProcessMetrics {
        memory_used_mb,
        memory_total_mb,
    }
}

impl ProcessMetrics {
    /// Formato: `"14ms | score 0.873 | RAM 212.4 MB / 15953.1 MB"`.
    pub fn summary_line(&self, elapsed_ms: u64, score: Option<f32>) -> String {
        let score_part = match score {
            Some(s) => format!(" | score {:.3}", s),
            None => String::new(),
        };
        format!(
            "{}ms{} | RAM {:.1} MB / {:.1} MB",
            elapsed_ms, score_part, self.memory_used_mb, self.memory_total_mb
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_formats_score_when_present() {
        let m = ProcessMetrics {
            memory_used_mb: 212.44,
            memory_total_mb: 1024.0,
        };
        assert_eq!(
            m.summary_line(14, Some(0.8731)),
            "14ms | score 0.873 | RAM 212.4 MB / 1024.0 MB"
        );
        assert_eq!(m.summary_line(3, None), "3ms | RAM 212.4 MB / 1024.0 MB");
    }

    #[test]
    fn collect_reports_some_total_memory() {
        assert!(collect_metrics().memory_total_mb > 0.0);
    }
}
