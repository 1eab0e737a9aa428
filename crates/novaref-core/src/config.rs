use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Upper bound on search results requested from CrossRef.
pub const MAX_SEARCH_ROWS: u32 = 15;

/// Root application configuration, loaded from `~/.config/novaref/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub crossref: CrossRefConfig,
    pub doi: DoiConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossRefConfig {
    pub base_url: String,
    pub rows: u32,
    /// Contact address for the CrossRef "polite pool".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polite_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DoiConfig {
    pub resolver_url: String,
    pub max_redirects: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CrossRefConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.crossref.org".to_string(),
            rows: MAX_SEARCH_ROWS,
            polite_email: None,
        }
    }
}

impl Default for DoiConfig {
    fn default() -> Self {
        Self {
            resolver_url: "https://doi.org".to_string(),
            max_redirects: 10,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            user_agent: format!("novaref/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CrossRefConfig {
    /// Requested row count, clamped to `1..=MAX_SEARCH_ROWS`.
    pub fn effective_rows(&self) -> u32 {
        self.rows.clamp(1, MAX_SEARCH_ROWS)
    }
}

impl HttpConfig {
    /// User agent with the polite-pool contact appended when one is configured.
    pub fn user_agent_for(&self, polite_email: Option<&str>) -> String {
        match polite_email {
            Some(email) if !email.trim().is_empty() => {
                format!("{} (mailto:{})", self.user_agent, email.trim())
            }
            _ => self.user_agent.clone(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/novaref/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("NOVAREF_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("novaref")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}
