//! Token usage accounting.
//!
//! Counters are purely additive. `session` lives only as long as the
//! process; per-day history and the running total are persisted to a JSON
//! ledger (`cost.json`) after every successful run. A missing or corrupt
//! ledger starts from zero instead of blocking the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Input/output token pair as stored in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenCount {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub output: u64,
}

impl TokenCount {
    fn add(&mut self, input: u64, output: u64) {
        self.input = self.input.saturating_add(input);
        self.output = self.output.saturating_add(output);
    }
}

/// On-disk ledger: `{"history": {"YYYY-MM-DD": {...}}, "total": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerFile {
    #[serde(default)]
    pub history: BTreeMap<String, TokenCount>,
    #[serde(default)]
    pub total: TokenCount,
}

impl LedgerFile {
    /// Keep `total` at least as large as the history it summarises.
    fn repair(&mut self) {
        let sum = self.history.values().fold(TokenCount::default(), |mut acc, day| {
            acc.add(day.input, day.output);
            acc
        });
        if self.total.input < sum.input || self.total.output < sum.output {
            log::warn!("[USAGE] Ledger total below history sum — raising it");
            self.total.input = self.total.input.max(sum.input);
            self.total.output = self.total.output.max(sum.output);
        }
    }
}

/// Read-only projection for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UsageStats {
    pub session: TokenCount,
    pub today: TokenCount,
    pub total: TokenCount,
}

struct Inner {
    session: TokenCount,
    ledger: LedgerFile,
}

/// Owner of the usage ledger. Written only by the pipeline worker after a
/// successful run; the UI reads `get_stats`.
pub struct UsageAccountant {
    path: Option<PathBuf>,
    inner: RwLock<Inner>,
}

/// Calendar date key on the local clock.
pub fn today_key() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

impl UsageAccountant {
    /// Load the ledger at `path`, or start empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut ledger = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<LedgerFile>(&raw).unwrap_or_else(|e| {
                log::error!(
                    "[USAGE] Corrupt ledger {}: {} — starting from zero",
                    path.display(),
                    e
                );
                LedgerFile::default()
            }),
            Err(_) => LedgerFile::default(),
        };
        ledger.repair();

        Self {
            path: Some(path),
            inner: RwLock::new(Inner {
                session: TokenCount::default(),
                ledger,
            }),
        }
    }

    /// Ledger that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: RwLock::new(Inner {
                session: TokenCount::default(),
                ledger: LedgerFile::default(),
            }),
        }
    }

    /// Add one run's usage to today's bucket, the session and the total.
    pub fn record(&self, input_tokens: u64, output_tokens: u64) {
        self.record_on(&today_key(), input_tokens, output_tokens);
    }

    pub fn record_on(&self, date: &str, input_tokens: u64, output_tokens: u64) {
        let snapshot = {
            let mut guard = match self.inner.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.session.add(input_tokens, output_tokens);
            guard
                .ledger
                .history
                .entry(date.to_string())
                .or_default()
                .add(input_tokens, output_tokens);
            guard.ledger.total.add(input_tokens, output_tokens);
            guard.ledger.clone()
        };

        log::info!(
            "[USAGE] +{} in / +{} out (total {} / {})",
            input_tokens,
            output_tokens,
            snapshot.total.input,
            snapshot.total.output
        );

        if let Some(path) = &self.path {
            if let Err(e) = persist(path, &snapshot) {
                log::error!("[USAGE] Failed to save ledger {}: {}", path.display(), e);
            }
        }
    }

    pub fn get_stats(&self) -> UsageStats {
        self.stats_on(&today_key())
    }

    pub fn stats_on(&self, date: &str) -> UsageStats {
        let guard = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        UsageStats {
            session: guard.session,
            today: guard.ledger.history.get(date).copied().unwrap_or_default(),
            total: guard.ledger.total,
        }
    }
}

/// Write to a sibling temp file, then rename over the ledger.
fn persist(path: &Path, ledger: &LedgerFile) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
        }
    }
    let json = serde_json::to_string_pretty(ledger).map_err(|e| e.to_string())?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| e.to_string())?;
    std::fs::rename(&tmp, path).map_err(|e| e.to_string())
}
