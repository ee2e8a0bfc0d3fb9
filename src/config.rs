use crate::error::{ReelkixError, Result};
use reelkix_common::{SocialLinks, DEFAULT_API_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// API URL を上書きする環境変数
pub const API_URL_ENV: &str = "REELKIX_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub api_url: String,
    pub social_links: SocialLinks,
    /// アップロード前に縮小する長辺の上限（px）
    pub max_image_size: u32,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            social_links: SocialLinks::default(),
            max_image_size: 2048,
            timeout_seconds: 60,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReelkixError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("reelkix").join("config.json"))
    }

    /// 実際に使う API URL（引数 > 環境変数 > 設定ファイル）
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> Result<String> {
        let env = std::env::var(API_URL_ENV).ok();
        pick_api_url(cli_override, env.as_deref(), &self.api_url)
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ReelkixError::Config(format!(
                "API URLは http:// または https:// で始めてください: {}",
                url
            )));
        }
        self.api_url = url;
        self.save()
    }
}

fn pick_api_url(cli: Option<&str>, env: Option<&str>, file: &str) -> Result<String> {
    [cli, env, Some(file)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or(ReelkixError::MissingApiUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_api_url_priority() {
        assert_eq!(pick_api_url(Some("http://cli"), Some("http://env"), "http://file").unwrap(), "http://cli");
        assert_eq!(pick_api_url(None, Some("http://env"), "http://file").unwrap(), "http://env");
        assert_eq!(pick_api_url(None, Some("  "), "http://file").unwrap(), "http://file");
    }

    #[test]
    fn test_pick_api_url_missing() {
        let err = pick_api_url(None, None, "").unwrap_err();
        assert!(matches!(err, ReelkixError::MissingApiUrl));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.max_image_size, 2048);
    }
}
