//! エラー型定義
//!
//! カメラ系・アップロード系のエラー分類と、ユーザー向けメッセージへの変換

use thiserror::Error;
use crate::types::ProblemDetails;

/// カメラ取得・撮影のエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("Camera access denied - please enable camera permissions")]
    PermissionDenied,

    #[error("No camera device found")]
    DeviceNotFound,

    #[error("Camera is already in use by another application")]
    DeviceBusy,

    #[error("No active camera session")]
    NoActiveSession,

    #[error("Failed to capture image - please try again")]
    Capture(String),

    #[error("Camera access failed")]
    Unknown(String),
}

impl CameraError {
    /// DOMException の name から分類する
    ///
    /// # Examples
    /// ```
    /// use reelkix_common::CameraError;
    ///
    /// assert_eq!(CameraError::from_dom_name("NotAllowedError", ""), CameraError::PermissionDenied);
    /// ```
    pub fn from_dom_name(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "SecurityError" => CameraError::PermissionDenied,
            "NotFoundError" | "OverconstrainedError" => CameraError::DeviceNotFound,
            "NotReadableError" | "TrackStartError" => CameraError::DeviceBusy,
            _ => CameraError::Unknown(format!("{}: {}", name, message)),
        }
    }
}

/// アップロードのエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("network error: {0}")]
    Network(String),

    #[error("{}", .0.message())]
    Api(ProblemDetails),

    #[error("unexpected HTTP status: {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    InvalidResponse(String),

    /// 送信前に検出した入力の不備（MIMEタイプなど）
    #[error("invalid upload: {0}")]
    InvalidInput(String),
}

impl UploadError {
    /// 画面に出すメッセージ
    ///
    /// 構造化エラー（ProblemDetails）はその内容を、それ以外は汎用メッセージを返す
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Api(problem) => problem.message(),
            _ => "Failed to analyze image. Please try again.".to_string(),
        }
    }
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid workflow transition: {event} while {state}")]
    InvalidTransition { state: &'static str, event: &'static str },

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn user_message(&self) -> String {
        match self {
            Error::Camera(e) => e.to_string(),
            Error::Upload(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
