//! 解析結果・アップロード関連の型定義
//!
//! CLIとWeb(WASM)で共有される型:
//! - AnalysisResult: 解析APIのレスポンス（画像URL + ShoeAnalysis）
//! - ProblemDetails: APIの構造化エラー
//! - ImageUpload: 送信する画像1枚

use serde::{Deserialize, Deserializer, Serialize};

/// `null` をデフォルト値として扱う
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// シューズ解析の中身
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoeAnalysis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub colorway: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub sku: String,

    /// 構造化できなかった場合の自由記述
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f64,
}

impl ShoeAnalysis {
    /// brand/model/colorway/sku のいずれかが空白以外なら構造化データあり
    pub fn has_structured_data(&self) -> bool {
        [&self.brand, &self.model, &self.colorway, &self.sku]
            .iter()
            .any(|s| !s.trim().is_empty())
    }

    /// 表示用フィールド（空欄と confidence 0 は除外）
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields: Vec<(&'static str, String)> = [
            ("Brand", &self.brand),
            ("Model", &self.model),
            ("Colorway", &self.colorway),
            ("SKU", &self.sku),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| (label, value.trim().to_string()))
        .collect();

        if self.confidence != 0.0 {
            fields.push(("Confidence", self.confidence.to_string()));
        }

        fields
    }
}

/// 解析APIの結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub analysis: ShoeAnalysis,
}

/// APIの構造化エラー
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub detail: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ProblemDetails {
    /// 通知に出す文言
    ///
    /// # Examples
    /// ```
    /// use reelkix_common::ProblemDetails;
    ///
    /// let problem = ProblemDetails {
    ///     title: "Validation".into(),
    ///     detail: "Unsupported format".into(),
    ///     status: None,
    /// };
    /// assert_eq!(problem.message(), "Validation: Unsupported format");
    /// ```
    pub fn message(&self) -> String {
        let title = self.title.trim();
        let detail = self.detail.trim();
        match (title.is_empty(), detail.is_empty()) {
            (false, false) => format!("{}: {}", title, detail),
            (true, _) => detail.to_string(),
            (false, true) => title.to_string(),
        }
    }

    /// title/detail のどちらかがあれば構造化エラーとみなす
    pub fn is_meaningful(&self) -> bool {
        !self.title.trim().is_empty() || !self.detail.trim().is_empty()
    }
}

/// 送信する画像
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl ImageUpload {
    pub const CAPTURE_FILE_NAME: &'static str = "capture.jpg";
    pub const CAPTURE_MIME_TYPE: &'static str = "image/jpeg";

    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// カメラで撮影したフレーム
    pub fn captured(bytes: Vec<u8>) -> Self {
        Self::new(bytes, Self::CAPTURE_FILE_NAME, Self::CAPTURE_MIME_TYPE)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
