//! 画像アップロード
//!
//! 送信処理そのものはプラットフォームごと（reqwest / fetch）に実装し、
//! エンドポイントの組み立てとレスポンスの解釈をここで共通化する。

use tracing::debug;

use crate::error::UploadError;
use crate::types::{AnalysisResult, ImageUpload, ProblemDetails};

/// アップロードAPIのパス
pub const UPLOAD_PATH: &str = "/image/upload";

/// multipart のフィールド名
pub const UPLOAD_FIELD: &str = "file";

/// 解析APIへの送信
#[allow(async_fn_in_trait)]
pub trait Uploader {
    async fn upload(&self, image: &ImageUpload) -> Result<AnalysisResult, UploadError>;
}

/// ベースURLからアップロード先URLを組み立てる
///
/// # Examples
/// ```
/// use reelkix_common::upload_url;
///
/// assert_eq!(upload_url("https://api.example.com/api/"), "https://api.example.com/api/image/upload");
/// ```
pub fn upload_url(base: &str) -> String {
    format!("{}{}", base.trim().trim_end_matches('/'), UPLOAD_PATH)
}

/// HTTPステータスとボディから結果を解釈
///
/// - 2xx: AnalysisResult（デコード失敗は InvalidResponse）
/// - それ以外: ProblemDetails があれば Api、なければ Status
pub fn parse_upload_response(status: u16, body: &str) -> Result<AnalysisResult, UploadError> {
    if (200..300).contains(&status) {
        return serde_json::from_str(body).map_err(|e| UploadError::InvalidResponse(e.to_string()));
    }

    match serde_json::from_str::<ProblemDetails>(body) {
        Ok(mut problem) if problem.is_meaningful() => {
            if problem.status.is_none() {
                problem.status = Some(status);
            }
            debug!(status, title = %problem.title, "APIエラー");
            Err(UploadError::Api(problem))
        }
        _ => Err(UploadError::Status(status)),
    }
}
