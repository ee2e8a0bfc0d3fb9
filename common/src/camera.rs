//! カメラ取得サービス
//!
//! プラットフォーム依存部分（getUserMedia 等）は [`MediaBackend`] に切り出し、
//! ストリームの開始・停止・切替・撮影とデバイス一覧の管理をここで行う。
//!
//! 状態は内部可変（RefCell/Cell）で持ち、await をまたいで借用しない。
//! 1スレッドのイベント駆動（ブラウザ）で共有参照から呼ばれる前提。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::device::{
    build_device_list, find_back_camera, next_device, DeviceDescriptor, FacingMode,
    MediaDeviceEntry, TrackSettings,
};
use crate::error::CameraError;
use crate::types::ImageUpload;

/// ストリーム取得時の制約
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConstraints {
    /// 指定があればこのデバイスのみ（exact）
    pub device_id: Option<String>,
    /// 背面カメラを優先（device_id 未指定時のみ有効）
    pub prefer_back_camera: bool,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            device_id: None,
            prefer_back_camera: false,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

impl CameraConstraints {
    pub fn back_camera() -> Self {
        Self {
            prefer_back_camera: true,
            ..Default::default()
        }
    }

    pub fn exact(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            ..Default::default()
        }
    }

    /// getUserMedia に渡す facingMode
    pub fn facing_mode(&self) -> Option<FacingMode> {
        if self.device_id.is_none() && self.prefer_back_camera {
            Some(FacingMode::Environment)
        } else {
            None
        }
    }
}

/// メディア取得のプラットフォーム実装
#[allow(async_fn_in_trait)]
pub trait MediaBackend {
    type Stream;

    /// 権限要求を含めてストリームを開く
    async fn open(&self, constraints: &CameraConstraints) -> Result<Self::Stream, CameraError>;

    /// 全メディアデバイスを列挙（kind の絞り込みは呼び出し側）
    async fn enumerate(&self) -> Result<Vec<MediaDeviceEntry>, CameraError>;

    /// ビデオトラックの設定値
    fn settings(&self, stream: &Self::Stream) -> Option<TrackSettings>;

    /// 静止画を1枚取得
    async fn grab_frame(&self, stream: &Self::Stream) -> Result<ImageUpload, CameraError>;

    /// 全トラックを停止してハードウェアを解放
    fn release(&self, stream: &Self::Stream);
}

pub struct CameraService<B: MediaBackend> {
    backend: B,
    stream: RefCell<Option<Rc<B::Stream>>>,
    devices: RefCell<Vec<DeviceDescriptor>>,
    active_device: RefCell<Option<String>>,
    /// stop のたびに進める。開始中に停止されたかどうかの判定用
    epoch: Cell<u64>,
}

impl<B: MediaBackend> CameraService<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            stream: RefCell::new(None),
            devices: RefCell::new(Vec::new()),
            active_device: RefCell::new(None),
            epoch: Cell::new(0),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_active(&self) -> bool {
        self.stream.borrow().is_some()
    }

    /// 現在のデバイス一覧（停止中は空）
    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        self.devices.borrow().clone()
    }

    pub fn active_device_id(&self) -> Option<String> {
        self.active_device.borrow().clone()
    }

    /// カメラを開始
    ///
    /// 背面優先で失敗した場合はデバイスを列挙し直し、背面カメラを
    /// exact 指定で1回だけ再試行する。見つからなければ元のエラーを返す。
    ///
    /// 開始待ちの間に [`stop`](Self::stop) された場合、取得したストリームは
    /// 即座に解放され `Ok(())` が返る（`is_active()` は false のまま）。
    pub async fn start(&self, constraints: &CameraConstraints) -> Result<(), CameraError> {
        self.stop();
        let epoch = self.epoch.get();

        let result = match self.backend.open(constraints).await {
            Ok(stream) => self.activate(stream, epoch).await,
            Err(err) if constraints.facing_mode().is_some() => {
                debug!(error = ?err, "背面カメラ指定での取得に失敗、デバイスを再列挙");
                self.fallback_to_back_camera(err, epoch).await
            }
            Err(err) => Err(err),
        };

        match result {
            // 開始待ちの間に停止された。エラーは呼び出し側に関係ない
            Err(err) if self.epoch.get() != epoch => {
                debug!(error = ?err, "停止済みの開始処理のエラーを破棄");
                Ok(())
            }
            Err(err) => {
                warn!(error = ?err, "カメラ取得失敗");
                Err(err)
            }
            Ok(()) => Ok(()),
        }
    }

    async fn fallback_to_back_camera(&self, original: CameraError, epoch: u64) -> Result<(), CameraError> {
        let entries = match self.backend.enumerate().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = ?e, "デバイス列挙失敗");
                return Err(original);
            }
        };

        if self.epoch.get() != epoch {
            return Err(original);
        }

        let devices = build_device_list(&entries, None);
        let Some(back) = find_back_camera(&devices) else {
            warn!(error = ?original, "背面カメラが見つかりません");
            return Err(original);
        };

        info!(device_id = %back.device_id, label = %back.label, "背面カメラで再試行");
        let stream = self.backend.open(&CameraConstraints::exact(back.device_id.clone())).await?;
        self.activate(stream, epoch).await
    }

    async fn activate(&self, stream: B::Stream, epoch: u64) -> Result<(), CameraError> {
        if self.epoch.get() != epoch {
            debug!("開始待ちの間に停止されたためストリームを破棄");
            self.backend.release(&stream);
            return Ok(());
        }

        let settings = self.backend.settings(&stream);
        *self.active_device.borrow_mut() = settings.as_ref().and_then(|s| s.device_id.clone());
        *self.stream.borrow_mut() = Some(Rc::new(stream));

        self.reload_devices(settings.as_ref(), epoch).await;
        Ok(())
    }

    async fn reload_devices(&self, settings: Option<&TrackSettings>, epoch: u64) {
        match self.backend.enumerate().await {
            Ok(entries) => {
                if self.epoch.get() != epoch {
                    return;
                }
                let devices = build_device_list(&entries, settings);
                debug!(count = devices.len(), "カメラデバイス一覧を更新");
                *self.devices.borrow_mut() = devices;
            }
            Err(e) => warn!(error = ?e, "デバイス列挙失敗"),
        }
    }

    /// 現在のストリームから静止画を取得
    pub async fn capture(&self) -> Result<ImageUpload, CameraError> {
        let stream = self
            .stream
            .borrow()
            .clone()
            .ok_or(CameraError::NoActiveSession)?;

        self.backend.grab_frame(&stream).await.map_err(|e| {
            warn!(error = ?e, "撮影失敗");
            match e {
                CameraError::Capture(_) | CameraError::NoActiveSession => e,
                other => CameraError::Capture(other.to_string()),
            }
        })
    }

    /// 指定デバイスに切替
    ///
    /// 既知のデバイスが2台未満なら何もせず `Ok(false)`
    pub async fn switch(&self, device_id: &str) -> Result<bool, CameraError> {
        if self.devices.borrow().len() < 2 {
            return Ok(false);
        }
        self.start(&CameraConstraints::exact(device_id)).await?;
        Ok(true)
    }

    /// 一覧で次のデバイスに切替
    pub async fn switch_to_next(&self) -> Result<bool, CameraError> {
        let next = {
            let devices = self.devices.borrow();
            let current = self.active_device.borrow();
            next_device(&devices, current.as_deref()).map(|d| d.device_id.clone())
        };

        match next {
            Some(device_id) => self.switch(&device_id).await,
            None => Ok(false),
        }
    }

    /// 全トラックを停止し、デバイス一覧を破棄
    pub fn stop(&self) {
        self.epoch.set(self.epoch.get().wrapping_add(1));

        let stream = self.stream.borrow_mut().take();
        if let Some(stream) = stream {
            self.backend.release(&stream);
            debug!("カメラ停止");
        }
        self.devices.borrow_mut().clear();
        *self.active_device.borrow_mut() = None;
    }
}

impl<B: MediaBackend> Drop for CameraService<B> {
    fn drop(&mut self) {
        self.stop();
    }
}
