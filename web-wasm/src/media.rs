//! getUserMedia によるカメラ実装
//!
//! プレビュー用の video 要素を1つ受け取り、開いたストリームをそこへ流す。
//! 撮影は video の現在フレームを canvas に描いて JPEG の Data URL から取り出す。

use std::cell::RefCell;

use base64::Engine as _;
use reelkix_common::{
    CameraConstraints, CameraError, DeviceKind, FacingMode, ImageUpload, MediaBackend,
    MediaDeviceEntry, TrackSettings,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, DomException, HtmlCanvasElement, HtmlVideoElement, MediaDeviceInfo,
    MediaDeviceKind, MediaDevices, MediaStream, MediaStreamConstraints, MediaStreamTrack,
};

/// getUserMedia の video 制約
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoConstraints<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    device_id: Option<Exact<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    facing_mode: Option<&'static str>,
    width: Ideal,
    height: Ideal,
}

#[derive(Serialize)]
struct Exact<'a> {
    exact: &'a str,
}

#[derive(Serialize)]
struct Ideal {
    ideal: u32,
}

impl<'a> From<&'a CameraConstraints> for VideoConstraints<'a> {
    fn from(c: &'a CameraConstraints) -> Self {
        Self {
            device_id: c.device_id.as_deref().map(|id| Exact { exact: id }),
            facing_mode: c.facing_mode().map(|m| m.as_str()),
            width: Ideal { ideal: c.ideal_width },
            height: Ideal { ideal: c.ideal_height },
        }
    }
}

/// JS例外をカメラエラーに変換
fn camera_error(err: JsValue) -> CameraError {
    match err.dyn_ref::<DomException>() {
        Some(dom) => CameraError::from_dom_name(&dom.name(), &dom.message()),
        None => CameraError::Unknown(format!("{:?}", err)),
    }
}

/// Data URL からBase64部分を取り出す
fn data_url_payload(data_url: &str) -> Option<&str> {
    data_url.split_once(',').map(|(_, data)| data)
}

#[derive(Default)]
pub struct BrowserMedia {
    preview: RefCell<Option<HtmlVideoElement>>,
}

impl BrowserMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// プレビュー先の video 要素を設定
    pub fn attach_preview(&self, video: HtmlVideoElement) {
        video.set_muted(true);
        video.set_autoplay(true);
        *self.preview.borrow_mut() = Some(video);
    }

    fn media_devices() -> Result<MediaDevices, CameraError> {
        web_sys::window()
            .ok_or_else(|| CameraError::Unknown("window がありません".into()))?
            .navigator()
            .media_devices()
            .map_err(|_| CameraError::DeviceNotFound)
    }

    fn preview(&self) -> Option<HtmlVideoElement> {
        self.preview.borrow().clone()
    }
}

impl MediaBackend for BrowserMedia {
    type Stream = MediaStream;

    async fn open(&self, constraints: &CameraConstraints) -> Result<MediaStream, CameraError> {
        let video = serde_wasm_bindgen::to_value(&VideoConstraints::from(constraints))
            .map_err(|e| CameraError::Unknown(e.to_string()))?;
        let request = MediaStreamConstraints::new();
        request.set_video(&video);
        request.set_audio(&JsValue::FALSE);

        let promise = Self::media_devices()?
            .get_user_media_with_constraints(&request)
            .map_err(camera_error)?;
        let stream: MediaStream = JsFuture::from(promise)
            .await
            .map_err(camera_error)?
            .dyn_into()
            .map_err(camera_error)?;

        if let Some(preview) = self.preview() {
            preview.set_src_object(Some(&stream));
            // 自動再生の拒否は無視（play は user gesture 内で呼ばれる）
            let _ = preview.play();
        }
        Ok(stream)
    }

    async fn enumerate(&self) -> Result<Vec<MediaDeviceEntry>, CameraError> {
        let promise = Self::media_devices()?
            .enumerate_devices()
            .map_err(camera_error)?;
        let list: js_sys::Array = JsFuture::from(promise)
            .await
            .map_err(camera_error)?
            .dyn_into()
            .map_err(camera_error)?;

        let entries = list
            .iter()
            .filter_map(|value| value.dyn_into::<MediaDeviceInfo>().ok())
            .filter_map(|info| {
                let kind = match info.kind() {
                    MediaDeviceKind::Videoinput => DeviceKind::VideoInput,
                    MediaDeviceKind::Audioinput => DeviceKind::AudioInput,
                    MediaDeviceKind::Audiooutput => DeviceKind::AudioOutput,
                    _ => return None,
                };
                Some(MediaDeviceEntry {
                    device_id: info.device_id(),
                    label: info.label(),
                    kind,
                })
            })
            .collect();
        Ok(entries)
    }

    fn settings(&self, stream: &MediaStream) -> Option<TrackSettings> {
        let track: MediaStreamTrack = stream.get_video_tracks().get(0).dyn_into().ok()?;
        let settings = track.get_settings();
        let field = |name: &str| {
            js_sys::Reflect::get(&settings, &JsValue::from_str(name))
                .ok()
                .and_then(|v| v.as_string())
        };

        Some(TrackSettings {
            device_id: field("deviceId"),
            facing_mode: field("facingMode").as_deref().and_then(FacingMode::parse),
        })
    }

    async fn grab_frame(&self, stream: &MediaStream) -> Result<ImageUpload, CameraError> {
        let video = self
            .preview()
            .ok_or_else(|| CameraError::Capture("プレビューがありません".into()))?;
        let attached = video
            .src_object()
            .is_some_and(|current| js_sys::Object::is(&current, stream));
        if !attached {
            return Err(CameraError::Capture("プレビューが別のストリームです".into()));
        }

        let (width, height) = (video.video_width(), video.video_height());
        if width == 0 || height == 0 {
            return Err(CameraError::Capture("映像がまだ準備できていません".into()));
        }

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| CameraError::Capture("document がありません".into()))?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(camera_error)?
            .dyn_into()
            .map_err(|_| CameraError::Capture("canvas を作成できません".into()))?;
        canvas.set_width(width);
        canvas.set_height(height);

        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(camera_error)?
            .and_then(|ctx| ctx.dyn_into().ok())
            .ok_or_else(|| CameraError::Capture("2Dコンテキストを取得できません".into()))?;
        context
            .draw_image_with_html_video_element(&video, 0.0, 0.0)
            .map_err(camera_error)?;

        let data_url = canvas
            .to_data_url_with_type(ImageUpload::CAPTURE_MIME_TYPE)
            .map_err(camera_error)?;
        let payload = data_url_payload(&data_url)
            .ok_or_else(|| CameraError::Capture("Data URLの形式が不正です".into()))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| CameraError::Capture(e.to_string()))?;

        Ok(ImageUpload::captured(bytes))
    }

    fn release(&self, stream: &MediaStream) {
        for track in stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }

        if let Some(preview) = self.preview() {
            let attached = preview
                .src_object()
                .is_some_and(|current| js_sys::Object::is(&current, stream));
            if attached {
                preview.set_src_object(None);
            }
        }
    }
}
