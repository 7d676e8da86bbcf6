use crate::status::DisplayMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub const KEY_API_URL: &str = "api_url";
pub const KEY_THEME: &str = "theme";
pub const KEY_DISPLAY_MODE: &str = "display_mode";

/// Process-wide string key-value store for user preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let guard = self.values.read().expect("preference store poisoned");
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.values.write().expect("preference store poisoned");
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object on disk, cached in memory. Every `set` rewrites the file.
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse preferences at {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read preferences at {}", path.display()));
            }
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let payload = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, payload)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let guard = self.values.read().expect("preference store poisoned");
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.values.write().expect("preference store poisoned");
        let mut next = guard.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// Typed view over a [`PreferenceStore`].
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// `None` when nothing valid is saved; the page then follows the browser.
    pub fn theme(&self) -> Option<Theme> {
        self.store.get(KEY_THEME).as_deref().and_then(Theme::parse)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store.set(KEY_THEME, theme.as_str())
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.store
            .get(KEY_DISPLAY_MODE)
            .as_deref()
            .and_then(DisplayMode::parse)
            .unwrap_or_default()
    }

    pub fn set_display_mode(&self, mode: DisplayMode) -> Result<()> {
        self.store.set(KEY_DISPLAY_MODE, mode.as_str())
    }

    pub fn api_url(&self) -> Option<String> {
        self.store
            .get(KEY_API_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
    }

    /// An empty string clears the override.
    pub fn set_api_url(&self, url: &str) -> Result<()> {
        self.store.set(KEY_API_URL, url.trim())
    }
}
