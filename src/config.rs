//! User configuration and its JSON persistence.
//!
//! Settings live in `~/.config/screen-translator/config.json` by default.
//! The settings UI mutates them through `ConfigStore::update`, which writes
//! through to disk on every change. Each pipeline run gets its own cloned
//! `Config` snapshot, so edits made mid-run are never visible inside it.

use crate::capture::CaptureRegion;
use crate::i18n::Language;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PROMPT: &str =
    "请将以下内容翻译成中文（如果是中文则润色），直接输出结果，不要包含额外解释：";

/// Application directory under the platform config dir.
pub fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("screen-translator")
}

/// Default location of the settings file.
pub fn default_config_path() -> PathBuf {
    app_dir().join("config.json")
}

/// Default location of the token usage ledger.
pub fn default_ledger_path() -> PathBuf {
    app_dir().join("cost.json")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    /// Whole-request timeout in seconds.
    pub timeout: u64,
    /// `[x, y, width, height]` in logical screen coordinates.
    pub region: [i32; 4],
    pub custom_prompt: String,
    pub proxy: String,
    pub language: Language,
    /// `true` sends the image to a vision model, `false` runs local OCR.
    pub advanced_mode: bool,
    /// Keys this version doesn't know about, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            region: [0, 0, 0, 0],
            custom_prompt: DEFAULT_PROMPT.to_string(),
            proxy: String::new(),
            language: Language::default(),
            advanced_mode: false,
            extra: Map::new(),
        }
    }
}

impl Config {
    /// Build settings from a parsed settings object, one key at a time.
    ///
    /// A missing, `null` or mistyped value falls back to that key's default
    /// without touching the others. Unrecognised keys land in `extra`.
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let mut config = Config::default();
        take(&mut map, "api_base", &mut config.api_base);
        take(&mut map, "api_key", &mut config.api_key);
        take(&mut map, "model", &mut config.model);
        take(&mut map, "timeout", &mut config.timeout);
        take(&mut map, "region", &mut config.region);
        take(&mut map, "custom_prompt", &mut config.custom_prompt);
        take(&mut map, "proxy", &mut config.proxy);
        take(&mut map, "language", &mut config.language);
        take(&mut map, "advanced_mode", &mut config.advanced_mode);
        config.extra = map;
        config
    }

    pub fn region(&self) -> CaptureRegion {
        CaptureRegion::from_config(self.region)
    }

    /// Effective timeout; zero falls back to the default.
    pub fn timeout_secs(&self) -> u64 {
        if self.timeout == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            self.timeout
        }
    }
}

fn take<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str, slot: &mut T) {
    match map.remove(key) {
        None | Some(Value::Null) => {}
        Some(value) => match serde_json::from_value::<T>(value.clone()) {
            Ok(parsed) => *slot = parsed,
            Err(e) => log::warn!(
                "[CONFIG] Invalid value for {}: {} ({}), using default",
                key,
                value,
                e
            ),
        },
    }
}

/// Owner of the on-disk settings file.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<Config>,
}

impl ConfigStore {
    /// Load settings from `path`.
    ///
    /// A missing file yields defaults. So does an unreadable one, or one
    /// that is not a JSON object, after logging the problem: the app must
    /// still start. Bad individual values only reset themselves.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => {
                    log::info!("[CONFIG] Loaded settings from {}", path.display());
                    Config::from_map(map)
                }
                Ok(other) => {
                    log::error!(
                        "[CONFIG] {} holds {} instead of an object, using defaults",
                        path.display(),
                        other
                    );
                    Config::default()
                }
                Err(e) => {
                    log::error!(
                        "[CONFIG] Failed to parse {}: {}, using defaults",
                        path.display(),
                        e
                    );
                    Config::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => {
                log::error!("[CONFIG] Failed to read {}: {}", path.display(), e);
                Config::default()
            }
        };

        Self {
            path,
            data: RwLock::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current settings, detached from later edits.
    pub fn snapshot(&self) -> Config {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply `f` to the settings and persist the result immediately.
    ///
    /// Returns the write error, if any; the in-memory settings keep the
    /// change either way.
    pub fn update<F>(&self, f: F) -> Result<(), String>
    where
        F: FnOnce(&mut Config),
    {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, config: &Config) -> Result<(), String> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| format!("Failed to create config dir: {}", e))?;
            }
        }
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(&self.path, json)
            .map_err(|e| format!("Failed to write config: {}", e))?;
        log::info!("[CONFIG] Saved settings to {}", self.path.display());
        Ok(())
    }
}
