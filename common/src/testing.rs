//! テスト用のフェイク実装
//!
//! `test-util` フィーチャーで外部クレートのテストからも使える

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use futures::channel::oneshot;

use crate::camera::{CameraConstraints, MediaBackend};
use crate::device::{DeviceKind, FacingMode, MediaDeviceEntry, TrackSettings};
use crate::error::{CameraError, UploadError};
use crate::notification::{Notification, Notifier};
use crate::types::{AnalysisResult, ImageUpload};
use crate::upload::Uploader;

/// ダミーのJPEGヘッダ
pub const FAKE_FRAME: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

#[derive(Debug)]
pub struct FakeStream {
    pub id: u32,
    pub settings: TrackSettings,
}

/// メモリ上のカメラ
#[derive(Default)]
pub struct FakeMedia {
    entries: RefCell<Vec<MediaDeviceEntry>>,
    facing: RefCell<HashMap<String, FacingMode>>,
    open_failures: RefCell<VecDeque<CameraError>>,
    open_gates: RefCell<VecDeque<oneshot::Receiver<Result<(), CameraError>>>>,
    frame_error: RefCell<Option<CameraError>>,
    opened: RefCell<Vec<CameraConstraints>>,
    live: Rc<Cell<usize>>,
    next_id: Cell<u32>,
}

impl FakeMedia {
    pub fn with_devices(entries: Vec<MediaDeviceEntry>) -> Self {
        Self {
            entries: RefCell::new(entries),
            ..Default::default()
        }
    }

    /// 次の open を指定エラーで失敗させる
    pub fn fail_next_open(&self, error: CameraError) {
        self.open_failures.borrow_mut().push_back(error);
    }

    /// 次の open を送信側の合図まで待たせる（Err を送るとそのエラーで失敗）
    pub fn hold_next_open(&self) -> oneshot::Sender<Result<(), CameraError>> {
        let (tx, rx) = oneshot::channel();
        self.open_gates.borrow_mut().push_back(rx);
        tx
    }

    /// 以降の撮影を失敗させる
    pub fn fail_frames(&self, error: CameraError) {
        *self.frame_error.borrow_mut() = Some(error);
    }

    pub fn set_facing_mode(&self, device_id: &str, mode: FacingMode) {
        self.facing.borrow_mut().insert(device_id.to_string(), mode);
    }

    pub fn opened(&self) -> Vec<CameraConstraints> {
        self.opened.borrow().clone()
    }

    /// 解放されていないストリーム数
    pub fn live_streams(&self) -> usize {
        self.live.get()
    }

    pub fn live_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.live)
    }

    fn pick_device(&self, constraints: &CameraConstraints) -> Option<String> {
        let entries = self.entries.borrow();
        let mut videos = entries.iter().filter(|e| e.kind == DeviceKind::VideoInput);

        if let Some(id) = &constraints.device_id {
            return videos.find(|e| &e.device_id == id).map(|e| e.device_id.clone());
        }

        if let Some(mode) = constraints.facing_mode() {
            let facing = self.facing.borrow();
            let preferred = entries
                .iter()
                .filter(|e| e.kind == DeviceKind::VideoInput)
                .find(|e| facing.get(&e.device_id) == Some(&mode));
            if let Some(entry) = preferred {
                return Some(entry.device_id.clone());
            }
        }

        videos.next().map(|e| e.device_id.clone())
    }
}

impl MediaBackend for FakeMedia {
    type Stream = FakeStream;

    async fn open(&self, constraints: &CameraConstraints) -> Result<FakeStream, CameraError> {
        self.opened.borrow_mut().push(constraints.clone());

        let gate = self.open_gates.borrow_mut().pop_front();
        if let Some(gate) = gate {
            gate.await
                .unwrap_or_else(|_| Err(CameraError::Unknown("open gate dropped".into())))?;
        }

        if let Some(error) = self.open_failures.borrow_mut().pop_front() {
            return Err(error);
        }

        let device_id = self.pick_device(constraints).ok_or(CameraError::DeviceNotFound)?;
        let facing_mode = self.facing.borrow().get(&device_id).copied();

        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.live.set(self.live.get() + 1);

        Ok(FakeStream {
            id,
            settings: TrackSettings {
                device_id: Some(device_id),
                facing_mode,
            },
        })
    }

    async fn enumerate(&self) -> Result<Vec<MediaDeviceEntry>, CameraError> {
        Ok(self.entries.borrow().clone())
    }

    fn settings(&self, stream: &FakeStream) -> Option<TrackSettings> {
        Some(stream.settings.clone())
    }

    async fn grab_frame(&self, _stream: &FakeStream) -> Result<ImageUpload, CameraError> {
        if let Some(error) = self.frame_error.borrow().clone() {
            return Err(error);
        }
        Ok(ImageUpload::captured(FAKE_FRAME.to_vec()))
    }

    fn release(&self, _stream: &FakeStream) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

enum Scripted {
    Ready(Result<AnalysisResult, UploadError>),
    Held(oneshot::Receiver<Result<AnalysisResult, UploadError>>),
}

/// 応答を順番に返すアップローダー
#[derive(Default)]
pub struct FakeUploader {
    script: RefCell<VecDeque<Scripted>>,
    uploads: RefCell<Vec<ImageUpload>>,
}

impl FakeUploader {
    pub fn respond(&self, response: Result<AnalysisResult, UploadError>) {
        self.script.borrow_mut().push_back(Scripted::Ready(response));
    }

    /// 送信側で応答タイミングを制御する
    pub fn hold(&self) -> oneshot::Sender<Result<AnalysisResult, UploadError>> {
        let (tx, rx) = oneshot::channel();
        self.script.borrow_mut().push_back(Scripted::Held(rx));
        tx
    }

    pub fn uploads(&self) -> Vec<ImageUpload> {
        self.uploads.borrow().clone()
    }
}

impl Uploader for FakeUploader {
    async fn upload(&self, image: &ImageUpload) -> Result<AnalysisResult, UploadError> {
        self.uploads.borrow_mut().push(image.clone());
        let next = self.script.borrow_mut().pop_front();
        match next {
            Some(Scripted::Ready(response)) => response,
            Some(Scripted::Held(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(UploadError::Network("response dropped".into()))),
            None => Err(UploadError::Network("no scripted response".into())),
        }
    }
}

/// 通知を記録する
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications.borrow().iter().map(|n| n.message.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.borrow_mut().push(notification);
    }
}

/// テスト用の解析結果
pub fn sample_result() -> AnalysisResult {
    AnalysisResult {
        message: "Image uploaded successfully".to_string(),
        image_url: "https://cdn.example.com/uploads/shoe.jpg".to_string(),
        analysis: crate::types::ShoeAnalysis {
            brand: "Nike".to_string(),
            model: "Dunk Low".to_string(),
            colorway: "Panda".to_string(),
            sku: "DD1391-100".to_string(),
            text: String::new(),
            confidence: 0.87,
        },
    }
}
