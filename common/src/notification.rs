//! ユーザー向け通知（スナックバー/トースト相当）

use std::rc::Rc;

use crate::error::{CameraError, Error, UploadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// 一時的に表示するメッセージ
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub action: String,
    pub duration_ms: u32,
    pub level: NotificationLevel,
}

impl Notification {
    pub const DEFAULT_DURATION_MS: u32 = 5000;
    pub const DISMISS: &'static str = "Dismiss";

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action: Self::DISMISS.to_string(),
            duration_ms: Self::DEFAULT_DURATION_MS,
            level: NotificationLevel::Error,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            ..Self::error(message)
        }
    }
}

impl From<&CameraError> for Notification {
    fn from(error: &CameraError) -> Self {
        Notification::error(error.to_string())
    }
}

impl From<&UploadError> for Notification {
    fn from(error: &UploadError) -> Self {
        Notification::error(error.user_message())
    }
}

impl From<&Error> for Notification {
    fn from(error: &Error) -> Self {
        Notification::error(error.user_message())
    }
}

/// 通知の表示先
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for Rc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}
