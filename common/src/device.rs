//! カメラデバイス情報
//!
//! デバイス一覧の構築と背面カメラの推定

use serde::{Deserialize, Serialize};

/// カメラの向き
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }

    /// MediaTrackSettings.facingMode の文字列から変換（未知の値は None）
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(FacingMode::User),
            "environment" => Some(FacingMode::Environment),
            _ => None,
        }
    }
}

/// enumerateDevices の kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// バックエンドが返す生のデバイス情報
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDeviceEntry {
    pub device_id: String,
    pub label: String,
    pub kind: DeviceKind,
}

impl MediaDeviceEntry {
    pub fn video(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
        }
    }
}

/// アクティブなトラックの設定値
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSettings {
    pub device_id: Option<String>,
    pub facing_mode: Option<FacingMode>,
}

/// カメラ1台分の識別情報
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub device_id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing_mode: Option<FacingMode>,
}

/// 背面カメラ判定に使うラベルのキーワード
pub const BACK_CAMERA_KEYWORDS: &[&str] = &["back", "rear", "environment"];

/// デバイス一覧を構築
///
/// - videoinput のみ残す
/// - ラベルが空なら "Camera N"（videoinput内の1始まりの順番）
/// - アクティブなトラックの facingMode を該当デバイスに書き戻す
pub fn build_device_list(
    entries: &[MediaDeviceEntry],
    active: Option<&TrackSettings>,
) -> Vec<DeviceDescriptor> {
    let mut devices: Vec<DeviceDescriptor> = entries
        .iter()
        .filter(|entry| entry.kind == DeviceKind::VideoInput)
        .enumerate()
        .map(|(i, entry)| DeviceDescriptor {
            device_id: entry.device_id.clone(),
            label: if entry.label.trim().is_empty() {
                format!("Camera {}", i + 1)
            } else {
                entry.label.clone()
            },
            facing_mode: None,
        })
        .collect();

    if let Some(settings) = active {
        if let Some(active_id) = settings.device_id.as_deref() {
            if let Some(device) = devices.iter_mut().find(|d| d.device_id == active_id) {
                device.facing_mode = settings.facing_mode;
            }
        }
    }

    devices
}

/// 背面カメラを推定
///
/// 1. facingMode が environment のデバイス
/// 2. ラベルに back/rear/environment を含むデバイス（大文字小文字無視）
///
/// ラベル判定は端末や言語設定に依存するため、あくまでベストエフォート
pub fn find_back_camera(devices: &[DeviceDescriptor]) -> Option<&DeviceDescriptor> {
    if let Some(device) = devices
        .iter()
        .find(|d| d.facing_mode == Some(FacingMode::Environment))
    {
        return Some(device);
    }

    devices.iter().find(|device| {
        let label = device.label.to_lowercase();
        BACK_CAMERA_KEYWORDS.iter().any(|kw| label.contains(kw))
    })
}

/// 一覧内で current の次のデバイス（末尾なら先頭へ）
pub fn next_device<'a>(devices: &'a [DeviceDescriptor], current: Option<&str>) -> Option<&'a DeviceDescriptor> {
    if devices.len() < 2 {
        return None;
    }
    let index = current
        .and_then(|id| devices.iter().position(|d| d.device_id == id))
        .map(|i| (i + 1) % devices.len())
        .unwrap_or(0);
    devices.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str, label: &str, facing: Option<FacingMode>) -> DeviceDescriptor {
        DeviceDescriptor {
            device_id: id.to_string(),
            label: label.to_string(),
            facing_mode: facing,
        }
    }

    #[test]
    fn test_build_device_list_filters_video() {
        let entries = vec![
            MediaDeviceEntry { device_id: "mic".into(), label: "Built-in Mic".into(), kind: DeviceKind::AudioInput },
            MediaDeviceEntry::video("cam-a", "FaceTime HD Camera"),
            MediaDeviceEntry { device_id: "spk".into(), label: "Speakers".into(), kind: DeviceKind::AudioOutput },
            MediaDeviceEntry::video("cam-b", "USB Camera"),
        ];

        let devices = build_device_list(&entries, None);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device_id, "cam-a");
        assert_eq!(devices[1].label, "USB Camera");
    }

    #[test]
    fn test_build_device_list_default_labels() {
        let entries = vec![
            MediaDeviceEntry { device_id: "mic".into(), label: "".into(), kind: DeviceKind::AudioInput },
            MediaDeviceEntry::video("cam-a", ""),
            MediaDeviceEntry::video("cam-b", "  "),
        ];

        let devices = build_device_list(&entries, None);
        assert_eq!(devices[0].label, "Camera 1");
        assert_eq!(devices[1].label, "Camera 2");
    }

    #[test]
    fn test_build_device_list_backfills_active_facing_mode() {
        let entries = vec![
            MediaDeviceEntry::video("front", "Front"),
            MediaDeviceEntry::video("cam-2", "Camera"),
        ];
        let settings = TrackSettings {
            device_id: Some("cam-2".into()),
            facing_mode: Some(FacingMode::Environment),
        };

        let devices = build_device_list(&entries, Some(&settings));
        assert_eq!(devices[0].facing_mode, None);
        assert_eq!(devices[1].facing_mode, Some(FacingMode::Environment));
    }

    #[test]
    fn test_find_back_camera_prefers_facing_mode() {
        let devices = vec![
            descriptor("a", "Rear Camera", None),
            descriptor("b", "Camera 2", Some(FacingMode::Environment)),
        ];
        assert_eq!(find_back_camera(&devices).map(|d| d.device_id.as_str()), Some("b"));
    }

    #[test]
    fn test_find_back_camera_label_case_insensitive() {
        let devices = vec![
            descriptor("front", "Front Camera", Some(FacingMode::User)),
            descriptor("back", "camera2 1, facing BACK", None),
        ];
        assert_eq!(find_back_camera(&devices).map(|d| d.device_id.as_str()), Some("back"));

        let devices = vec![descriptor("x", "Rear Wide", None)];
        assert!(find_back_camera(&devices).is_some());

        let devices = vec![descriptor("x", "ENVIRONMENT lens", None)];
        assert!(find_back_camera(&devices).is_some());
    }

    #[test]
    fn test_find_back_camera_none() {
        let devices = vec![
            descriptor("a", "FaceTime HD Camera", None),
            descriptor("b", "Camera 2", Some(FacingMode::User)),
        ];
        assert!(find_back_camera(&devices).is_none());
        assert!(find_back_camera(&[]).is_none());
    }

    #[test]
    fn test_next_device_wraps() {
        let devices = vec![
            descriptor("a", "A", None),
            descriptor("b", "B", None),
            descriptor("c", "C", None),
        ];
        assert_eq!(next_device(&devices, Some("a")).map(|d| d.device_id.as_str()), Some("b"));
        assert_eq!(next_device(&devices, Some("c")).map(|d| d.device_id.as_str()), Some("a"));
        assert_eq!(next_device(&devices, None).map(|d| d.device_id.as_str()), Some("a"));
        assert_eq!(next_device(&devices, Some("gone")).map(|d| d.device_id.as_str()), Some("a"));
    }

    #[test]
    fn test_next_device_single() {
        let devices = vec![descriptor("a", "A", None)];
        assert!(next_device(&devices, Some("a")).is_none());
    }

    #[test]
    fn test_facing_mode_parse() {
        assert_eq!(FacingMode::parse("environment"), Some(FacingMode::Environment));
        assert_eq!(FacingMode::parse("user"), Some(FacingMode::User));
        assert_eq!(FacingMode::parse("left"), None);
        assert_eq!(FacingMode::Environment.as_str(), "environment");
    }
}
