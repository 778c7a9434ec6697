use crate::error::{PcbInspectError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// APIのURLを上書きする環境変数
pub const API_URL_ENV: &str = "PCB_INSPECT_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub timeout_seconds: u64,
    pub download_dir: PathBuf,
    pub page_size: u32,
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default_config()
        };

        // 環境変数を優先
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_base_url = url.trim().to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PcbInspectError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("pcb-inspect"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            api_base_url: "http://localhost:8000".into(),
            timeout_seconds: 60,
            download_dir: PathBuf::from("."),
            page_size: pcb_inspect_common::pagination::PAGE_SIZE,
            debounce_ms: 300,
        }
    }

    /// ページサイズはサーバーと合わせて固定
    pub fn validate(&self) -> Result<()> {
        if self.page_size != pcb_inspect_common::pagination::PAGE_SIZE {
            return Err(PcbInspectError::Config(format!(
                "page_size は {} 固定です（設定値: {}）",
                pcb_inspect_common::pagination::PAGE_SIZE,
                self.page_size
            )));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(PcbInspectError::Config(format!(
                "api_base_url が不正です: {}",
                self.api_base_url
            )));
        }
        Ok(())
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        self.api_base_url = url.trim_end_matches('/').to_string();
        self.validate()?;
        self.save()
    }

    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}
