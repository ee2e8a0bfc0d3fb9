//! 外部から与える設定値（APIのベースURL、SNSリンク）

use serde::{Deserialize, Serialize};

/// APIベースURLの既定値
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// SNSリンク
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLinks {
    pub facebook: String,
    pub instagram: String,
    pub tiktok: String,
}

impl Default for SocialLinks {
    fn default() -> Self {
        Self {
            facebook: "https://www.facebook.com/reelkix".to_string(),
            instagram: "https://www.instagram.com/reelkix".to_string(),
            tiktok: "https://www.tiktok.com/@reelkix".to_string(),
        }
    }
}

impl SocialLinks {
    /// 空でないリンクを (名前, URL) で返す
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Facebook", self.facebook.as_str()),
            ("Instagram", self.instagram.as_str()),
            ("TikTok", self.tiktok.as_str()),
        ]
        .into_iter()
        .filter(|(_, url)| !url.trim().is_empty())
        .collect()
    }
}

/// クライアント設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    pub api_url: String,
    pub social_links: SocialLinks,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            social_links: SocialLinks::default(),
        }
    }
}

impl ClientSettings {
    /// ビルド時の環境変数など、省略可能な値から組み立てる
    pub fn from_overrides(api_url: Option<&str>) -> Self {
        let mut settings = Self::default();
        if let Some(url) = api_url.map(str::trim).filter(|u| !u.is_empty()) {
            settings.api_url = url.to_string();
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_overrides() {
        assert_eq!(ClientSettings::from_overrides(None).api_url, DEFAULT_API_URL);
        assert_eq!(ClientSettings::from_overrides(Some("  ")).api_url, DEFAULT_API_URL);
        assert_eq!(
            ClientSettings::from_overrides(Some("https://api.reelkix.test")).api_url,
            "https://api.reelkix.test"
        );
    }

    #[test]
    fn test_social_links_skip_blank() {
        let links = SocialLinks {
            tiktok: String::new(),
            ..Default::default()
        };
        let names: Vec<&str> = links.entries().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["Facebook", "Instagram"]);
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"socialLinks":{"instagram":"https://ig.test/r"}}"#).unwrap();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.social_links.instagram, "https://ig.test/r");
        assert_eq!(settings.social_links.facebook, SocialLinks::default().facebook);
    }
}
