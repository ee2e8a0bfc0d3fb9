use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelkixError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("API URLが設定されていません。`reelkix config --set-api-url URL` で設定してください")]
    MissingApiUrl,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("対応していない画像形式です: {0}")]
    UnsupportedImage(String),

    #[error("HTTPクライアントエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("解析に失敗しました: {0}")]
    AnalysisFailed(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] reelkix_common::Error),
}

pub type Result<T> = std::result::Result<T, ReelkixError>;
