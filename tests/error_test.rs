//! エラー表示テスト

use reelkix::error::ReelkixError;
use reelkix_common::{CameraError, Error, Notification, UploadError};

/// ReelkixErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        ReelkixError::Config("テスト設定エラー".to_string()),
        ReelkixError::MissingApiUrl,
        ReelkixError::FileNotFound("shoe.jpg".to_string()),
        ReelkixError::ImageLoad("壊れた画像".to_string()),
        ReelkixError::UnsupportedImage("notes.txt".to_string()),
        ReelkixError::AnalysisFailed("タイムアウト".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// 共通クレートのエラーはそのまま表示する
#[test]
fn test_common_error_is_transparent() {
    let err: ReelkixError = Error::from(CameraError::PermissionDenied).into();
    assert_eq!(err.to_string(), CameraError::PermissionDenied.to_string());
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: ReelkixError = io.into();
    assert!(matches!(err, ReelkixError::Io(_)));
}

/// ユーザー向け通知の文言
#[test]
fn test_notification_messages() {
    let camera = Notification::from(&CameraError::DeviceBusy);
    assert_eq!(camera.message, CameraError::DeviceBusy.to_string());
    assert_eq!(camera.duration_ms, 5000);

    let upload = Notification::from(&UploadError::Status(502));
    assert_eq!(upload.message, "Failed to analyze image. Please try again.");
}
