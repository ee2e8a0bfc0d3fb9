//! アップロードワークフロー
//!
//! 状態遷移:
//! - Idle -> CameraActive: カメラ開始
//! - CameraActive -> Uploading: 撮影またはファイル選択（カメラは停止）
//! - Idle -> Uploading: ファイル選択/ドロップ
//! - Uploading -> Done: 成功（結果をセッションに保存）
//! - Uploading -> Idle: 失敗（通知）
//! - 任意 -> Idle: カメラエラー
//!
//! [`Workflow`] は副作用のない状態機械、[`UploadWorkflow`] がカメラ・
//! アップローダー・セッション・通知をつないで非同期に駆動する。

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use futures::future::{AbortHandle, Abortable};
use tracing::{debug, info, warn};

use crate::camera::{CameraConstraints, CameraService, MediaBackend};
use crate::error::{CameraError, Error, Result, UploadError};
use crate::notification::{Notification, Notifier};
use crate::session::{AnalysisSession, SessionStore};
use crate::types::{AnalysisResult, ImageUpload};
use crate::upload::Uploader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    CameraActive,
    Uploading,
    Done,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::CameraActive => "camera-active",
            WorkflowState::Uploading => "uploading",
            WorkflowState::Done => "done",
        }
    }
}

/// アップロード1回分の受付票
///
/// 世代が現在の世代と一致するときだけ応答を受け付ける
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
    /// 受付時にカメラが動いていた（呼び出し側で停止する）
    pub stop_camera: bool,
}

/// アップロード応答の処理結果
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Done(AnalysisResult),
    Failed(UploadError),
    /// 新しいアップロード・カメラエラー・破棄によって無効になった応答
    Stale,
}

/// 状態機械
#[derive(Debug, Default)]
pub struct Workflow {
    state: WorkflowState,
    generation: u64,
    torn_down: bool,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn invalid(&self, event: &'static str) -> Error {
        Error::InvalidTransition {
            state: self.state.as_str(),
            event,
        }
    }

    /// ユーザー操作でカメラを開始（開始処理の前に遷移する）
    pub fn begin_camera(&mut self) -> Result<()> {
        if self.torn_down {
            return Err(Error::Cancelled);
        }
        match self.state {
            WorkflowState::Idle | WorkflowState::CameraActive => {
                self.state = WorkflowState::CameraActive;
                Ok(())
            }
            _ => Err(self.invalid("start camera")),
        }
    }

    /// ユーザー操作でカメラを停止
    pub fn camera_stopped(&mut self) {
        if self.state == WorkflowState::CameraActive {
            self.state = WorkflowState::Idle;
        }
    }

    /// アップロード開始。進行中のアップロードがあれば置き換える
    pub fn begin_upload(&mut self) -> Result<UploadTicket> {
        if self.torn_down {
            return Err(Error::Cancelled);
        }
        if self.state == WorkflowState::Done {
            return Err(self.invalid("upload"));
        }

        let stop_camera = self.state == WorkflowState::CameraActive;
        self.generation += 1;
        self.state = WorkflowState::Uploading;

        Ok(UploadTicket {
            generation: self.generation,
            stop_camera,
        })
    }

    /// アップロード応答を反映
    pub fn complete_upload(
        &mut self,
        ticket: UploadTicket,
        response: std::result::Result<AnalysisResult, UploadError>,
    ) -> UploadOutcome {
        if self.torn_down
            || ticket.generation != self.generation
            || self.state != WorkflowState::Uploading
        {
            return UploadOutcome::Stale;
        }

        match response {
            Ok(result) => {
                self.state = WorkflowState::Done;
                UploadOutcome::Done(result)
            }
            Err(error) => {
                self.state = WorkflowState::Idle;
                UploadOutcome::Failed(error)
            }
        }
    }

    /// カメラエラー。Idle に戻し、進行中の応答は無効にする
    pub fn camera_failed(&mut self, error: &CameraError) -> Notification {
        if self.state != WorkflowState::Done {
            self.state = WorkflowState::Idle;
            self.generation += 1;
        }
        Notification::from(error)
    }

    /// 結果表示後に最初からやり直す
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = WorkflowState::Idle;
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.generation += 1;
        self.state = WorkflowState::Idle;
    }
}

#[derive(Default)]
struct TeardownInner {
    fired: bool,
    next_id: u64,
    pending: HashMap<u64, AbortHandle>,
}

/// 破棄ハンドル
///
/// 登録された処理を一括で中断する。クローンは同じ状態を共有する
#[derive(Clone, Default)]
pub struct Teardown {
    inner: Rc<RefCell<TeardownInner>>,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fired(&self) -> bool {
        self.inner.borrow().fired
    }

    /// 登録中の処理数
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    pub fn fire(&self) {
        let handles: Vec<AbortHandle> = {
            let mut inner = self.inner.borrow_mut();
            inner.fired = true;
            inner.pending.drain().map(|(_, h)| h).collect()
        };
        for handle in handles {
            handle.abort();
        }
    }

    /// 破棄されたら中断される Future として実行
    pub async fn guard<F: Future>(&self, future: F) -> Result<F::Output> {
        let (handle, registration) = AbortHandle::new_pair();
        let id = {
            let mut inner = self.inner.borrow_mut();
            if inner.fired {
                handle.abort();
            }
            let id = inner.next_id;
            inner.next_id += 1;
            inner.pending.insert(id, handle);
            id
        };

        let output = Abortable::new(future, registration).await;
        self.inner.borrow_mut().pending.remove(&id);
        output.map_err(|_| Error::Cancelled)
    }
}

/// ワークフロー本体
pub struct UploadWorkflow<B, U, S, N>
where
    B: MediaBackend,
    U: Uploader,
    S: SessionStore,
    N: Notifier,
{
    machine: RefCell<Workflow>,
    camera: CameraService<B>,
    uploader: U,
    session: AnalysisSession<S>,
    notifier: N,
    teardown: Teardown,
}

impl<B, U, S, N> UploadWorkflow<B, U, S, N>
where
    B: MediaBackend,
    U: Uploader,
    S: SessionStore,
    N: Notifier,
{
    pub fn new(media: B, uploader: U, session: AnalysisSession<S>, notifier: N) -> Self {
        Self {
            machine: RefCell::new(Workflow::new()),
            camera: CameraService::new(media),
            uploader,
            session,
            notifier,
            teardown: Teardown::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.machine.borrow().state()
    }

    pub fn camera(&self) -> &CameraService<B> {
        &self.camera
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn session(&self) -> &AnalysisSession<S> {
        &self.session
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn teardown_handle(&self) -> Teardown {
        self.teardown.clone()
    }

    /// 背面優先でカメラを開始
    pub async fn start_camera(&self) -> Result<()> {
        self.machine.borrow_mut().begin_camera()?;

        match self.camera.start(&CameraConstraints::back_camera()).await {
            Ok(()) => {
                // 開始待ちの間にアップロードや停止が入った場合
                if self.state() != WorkflowState::CameraActive {
                    self.camera.stop();
                } else if !self.camera.is_active() {
                    self.machine.borrow_mut().camera_stopped();
                }
                Ok(())
            }
            Err(e) => {
                self.fail_camera(e.clone());
                Err(e.into())
            }
        }
    }

    pub fn stop_camera(&self) {
        self.camera.stop();
        self.machine.borrow_mut().camera_stopped();
    }

    /// 次のカメラへ切替（2台未満なら何もしない）
    pub async fn switch_camera(&self) -> Result<bool> {
        match self.camera.switch_to_next().await {
            Ok(switched) => Ok(switched),
            Err(e) => {
                self.fail_camera(e.clone());
                Err(e.into())
            }
        }
    }

    /// 撮影してアップロード
    pub async fn capture_and_upload(&self) -> Result<UploadOutcome> {
        match self.camera.capture().await {
            Ok(image) => self.upload(image).await,
            Err(e) => {
                self.fail_camera(e.clone());
                Err(e.into())
            }
        }
    }

    /// 選択/ドロップされたファイルをアップロード
    pub async fn upload_file(&self, image: ImageUpload) -> Result<UploadOutcome> {
        self.upload(image).await
    }

    async fn upload(&self, image: ImageUpload) -> Result<UploadOutcome> {
        let ticket = self.machine.borrow_mut().begin_upload()?;
        if ticket.stop_camera {
            self.camera.stop();
        }

        info!(file = %image.file_name, bytes = image.len(), "アップロード開始");
        let response = self.teardown.guard(self.uploader.upload(&image)).await?;

        let outcome = self.machine.borrow_mut().complete_upload(ticket, response);
        match &outcome {
            UploadOutcome::Done(result) => {
                self.session.put(result)?;
                info!(image_url = %result.image_url, "解析完了");
            }
            UploadOutcome::Failed(error) => {
                warn!(error = %error, "アップロード失敗");
                self.notifier.notify(Notification::from(error));
            }
            UploadOutcome::Stale => debug!("古いアップロード応答を破棄"),
        }
        Ok(outcome)
    }

    /// 非同期に届いたカメラエラー
    pub fn fail_camera(&self, error: CameraError) {
        let notification = self.machine.borrow_mut().camera_failed(&error);
        self.camera.stop();
        if !self.teardown.is_fired() {
            self.notifier.notify(notification);
        }
    }

    /// 結果画面から戻ったとき
    pub fn reset(&self) {
        self.machine.borrow_mut().reset();
    }

    /// 画面破棄。処理中の Future を中断し、カメラを解放する
    pub fn teardown(&self) {
        self.teardown.fire();
        self.machine.borrow_mut().teardown();
        self.camera.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MediaDeviceEntry;
    use crate::session::MemoryStore;
    use crate::testing::{sample_result, FakeMedia, FakeUploader, RecordingNotifier};
    use crate::types::ProblemDetails;
    use futures::executor::block_on;
    use futures::future::{join, join3};

    type TestWorkflow = UploadWorkflow<FakeMedia, FakeUploader, MemoryStore, RecordingNotifier>;

    fn workflow() -> TestWorkflow {
        let media = FakeMedia::with_devices(vec![
            MediaDeviceEntry::video("front", "Front Camera"),
            MediaDeviceEntry::video("back", "Back Camera"),
        ]);
        UploadWorkflow::new(
            media,
            FakeUploader::default(),
            AnalysisSession::new(MemoryStore::new()),
            RecordingNotifier::default(),
        )
    }

    fn file() -> ImageUpload {
        ImageUpload::new(vec![1, 2, 3], "shoe.png", "image/png")
    }

    // =============================================
    // 状態機械
    // =============================================

    #[test]
    fn test_machine_camera_then_upload() {
        let mut machine = Workflow::new();
        machine.begin_camera().unwrap();
        assert_eq!(machine.state(), WorkflowState::CameraActive);

        let ticket = machine.begin_upload().unwrap();
        assert!(ticket.stop_camera);
        assert_eq!(machine.state(), WorkflowState::Uploading);

        let outcome = machine.complete_upload(ticket, Ok(sample_result()));
        assert_eq!(outcome, UploadOutcome::Done(sample_result()));
        assert_eq!(machine.state(), WorkflowState::Done);
    }

    #[test]
    fn test_machine_failure_returns_to_idle() {
        let mut machine = Workflow::new();
        let ticket = machine.begin_upload().unwrap();
        assert!(!ticket.stop_camera);

        let outcome = machine.complete_upload(ticket, Err(UploadError::Status(500)));
        assert_eq!(outcome, UploadOutcome::Failed(UploadError::Status(500)));
        assert_eq!(machine.state(), WorkflowState::Idle);
    }

    #[test]
    fn test_machine_last_response_wins() {
        let mut machine = Workflow::new();
        let first = machine.begin_upload().unwrap();
        let second = machine.begin_upload().unwrap();

        assert_eq!(machine.complete_upload(first, Ok(sample_result())), UploadOutcome::Stale);
        assert_eq!(machine.state(), WorkflowState::Uploading);
        assert!(matches!(machine.complete_upload(second, Ok(sample_result())), UploadOutcome::Done(_)));
    }

    #[test]
    fn test_machine_camera_error_invalidates_upload() {
        let mut machine = Workflow::new();
        let ticket = machine.begin_upload().unwrap();
        let n = machine.camera_failed(&CameraError::DeviceBusy);

        assert_eq!(n.message, "Camera is already in use by another application");
        assert_eq!(machine.state(), WorkflowState::Idle);
        assert_eq!(machine.complete_upload(ticket, Ok(sample_result())), UploadOutcome::Stale);
    }

    #[test]
    fn test_machine_done_rejects_upload_until_reset() {
        let mut machine = Workflow::new();
        let ticket = machine.begin_upload().unwrap();
        machine.complete_upload(ticket, Ok(sample_result()));

        assert!(matches!(machine.begin_upload(), Err(Error::InvalidTransition { .. })));
        assert!(machine.begin_camera().is_err());

        machine.reset();
        assert_eq!(machine.state(), WorkflowState::Idle);
        assert!(machine.begin_upload().is_ok());
    }

    #[test]
    fn test_machine_teardown() {
        let mut machine = Workflow::new();
        let ticket = machine.begin_upload().unwrap();
        machine.teardown();

        assert_eq!(machine.complete_upload(ticket, Ok(sample_result())), UploadOutcome::Stale);
        assert!(matches!(machine.begin_upload(), Err(Error::Cancelled)));
        assert!(matches!(machine.begin_camera(), Err(Error::Cancelled)));
    }

    // =============================================
    // 非同期ドライバ
    // =============================================

    #[test]
    fn test_capture_upload_success() {
        let wf = workflow();
        wf.uploader().respond(Ok(sample_result()));

        block_on(wf.start_camera()).unwrap();
        assert_eq!(wf.state(), WorkflowState::CameraActive);

        let outcome = block_on(wf.capture_and_upload()).unwrap();
        assert_eq!(outcome, UploadOutcome::Done(sample_result()));
        assert_eq!(wf.state(), WorkflowState::Done);

        // カメラは停止済み
        assert!(!wf.camera().is_active());
        assert_eq!(wf.camera().backend().live_streams(), 0);

        // 結果は1回だけ読める
        assert_eq!(wf.session().take(), Some(sample_result()));
        assert_eq!(wf.session().take(), None);

        let uploads = wf.uploader().uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].file_name, "capture.jpg");
    }

    #[test]
    fn test_file_upload_from_idle() {
        let wf = workflow();
        wf.uploader().respond(Ok(sample_result()));

        let outcome = block_on(wf.upload_file(file())).unwrap();
        assert!(matches!(outcome, UploadOutcome::Done(_)));
        assert_eq!(wf.uploader().uploads()[0].mime_type, "image/png");
        assert!(wf.notifier().notifications().is_empty());
    }

    #[test]
    fn test_api_error_notifies_title_and_detail() {
        let wf = workflow();
        wf.uploader().respond(Err(UploadError::Api(ProblemDetails {
            title: "Validation".into(),
            detail: "Unsupported format".into(),
            status: Some(400),
        })));

        let outcome = block_on(wf.upload_file(file())).unwrap();
        assert!(matches!(outcome, UploadOutcome::Failed(UploadError::Api(_))));
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert!(wf.session().peek().is_none());

        let messages = wf.notifier().messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Validation"));
        assert!(messages[0].contains("Unsupported format"));
    }

    #[test]
    fn test_network_error_generic_message() {
        let wf = workflow();
        wf.uploader().respond(Err(UploadError::Network("timeout".into())));

        block_on(wf.upload_file(file())).unwrap();
        assert_eq!(wf.notifier().messages(), vec!["Failed to analyze image. Please try again."]);
    }

    #[test]
    fn test_camera_start_failure_returns_to_idle() {
        let media = FakeMedia::with_devices(vec![MediaDeviceEntry::video("a", "Webcam")]);
        media.fail_next_open(CameraError::PermissionDenied);
        let wf = UploadWorkflow::new(
            media,
            FakeUploader::default(),
            AnalysisSession::new(MemoryStore::new()),
            RecordingNotifier::default(),
        );

        let err = block_on(wf.start_camera()).unwrap_err();
        assert!(matches!(err, Error::Camera(CameraError::PermissionDenied)));
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert_eq!(
            wf.notifier().messages(),
            vec!["Camera access denied - please enable camera permissions"]
        );
    }

    #[test]
    fn test_capture_failure_stops_camera() {
        let wf = workflow();
        block_on(wf.start_camera()).unwrap();
        wf.camera().backend().fail_frames(CameraError::Capture("no frame".into()));

        let err = block_on(wf.capture_and_upload()).unwrap_err();
        assert!(matches!(err, Error::Camera(CameraError::Capture(_))));
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert!(!wf.camera().is_active());
        assert_eq!(wf.notifier().messages(), vec!["Failed to capture image - please try again"]);
    }

    #[test]
    fn test_capture_without_camera() {
        let wf = workflow();
        let err = block_on(wf.capture_and_upload()).unwrap_err();
        assert!(matches!(err, Error::Camera(CameraError::NoActiveSession)));
        assert!(wf.uploader().uploads().is_empty());
    }

    #[test]
    fn test_stop_camera_toggle() {
        let wf = workflow();
        block_on(wf.start_camera()).unwrap();
        wf.stop_camera();
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert_eq!(wf.camera().backend().live_streams(), 0);
    }

    #[test]
    fn test_overlapping_uploads_last_wins() {
        let wf = workflow();
        let first = wf.uploader().hold();
        let second = wf.uploader().hold();

        // 1つ目・2つ目が応答待ちになった後、1つ目の応答を遅れて返す
        let responder = async {
            second.send(Ok(sample_result())).unwrap();
            let mut late = sample_result();
            late.analysis.brand = "Late".into();
            first.send(Ok(late)).unwrap();
        };
        let run = join3(wf.upload_file(file()), wf.upload_file(file()), responder);

        let (a, b, ()) = block_on(run);
        assert_eq!(a.unwrap(), UploadOutcome::Stale);
        assert!(matches!(b.unwrap(), UploadOutcome::Done(ref r) if r.analysis.brand == "Nike"));
        assert_eq!(wf.session().take().unwrap().analysis.brand, "Nike");
    }

    #[test]
    fn test_teardown_cancels_pending_upload() {
        let wf = workflow();
        let _held = wf.uploader().hold();
        let teardown = wf.teardown_handle();

        let run = join(wf.upload_file(file()), async {
            teardown.fire();
        });
        let (outcome, ()) = block_on(run);

        assert!(matches!(outcome, Err(Error::Cancelled)));
        assert_eq!(teardown.pending(), 0);
        assert!(wf.session().peek().is_none());
    }

    #[test]
    fn test_teardown_releases_camera_and_blocks_new_work() {
        let wf = workflow();
        block_on(wf.start_camera()).unwrap();
        wf.teardown();

        assert_eq!(wf.camera().backend().live_streams(), 0);
        assert!(matches!(block_on(wf.upload_file(file())), Err(Error::Cancelled)));
        assert!(wf.notifier().notifications().is_empty());
    }

    #[test]
    fn test_guard_after_fire_is_cancelled() {
        let teardown = Teardown::new();
        teardown.fire();
        let result = block_on(teardown.guard(async { 42 }));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_switch_camera_single_device_noop() {
        let media = FakeMedia::with_devices(vec![MediaDeviceEntry::video("a", "Webcam")]);
        let wf = UploadWorkflow::new(
            media,
            FakeUploader::default(),
            AnalysisSession::new(MemoryStore::new()),
            RecordingNotifier::default(),
        );
        block_on(wf.start_camera()).unwrap();
        assert!(!block_on(wf.switch_camera()).unwrap());
        assert!(wf.camera().is_active());
    }

    #[test]
    fn test_file_drop_while_camera_starting_keeps_upload() {
        let wf = workflow();
        let camera_gate = wf.camera().backend().hold_next_open();
        let response = wf.uploader().hold();

        // 権限ダイアログ表示中にファイルが選ばれ、その後カメラが拒否される
        let driver = async {
            camera_gate.send(Err(CameraError::PermissionDenied)).unwrap();
            response.send(Ok(sample_result())).unwrap();
        };
        let (started, uploaded, ()) = block_on(join3(wf.start_camera(), wf.upload_file(file()), driver));

        assert!(started.is_ok());
        assert!(matches!(uploaded, Ok(UploadOutcome::Done(_))));
        assert_eq!(wf.state(), WorkflowState::Done);
        assert!(wf.session().peek().is_some());
        assert!(wf.notifier().notifications().is_empty());
        assert!(!wf.camera().is_active());
    }

    #[test]
    fn test_reset_after_done_allows_next_upload() {
        let wf = workflow();
        wf.uploader().respond(Ok(sample_result()));
        wf.uploader().respond(Ok(sample_result()));

        block_on(wf.upload_file(file())).unwrap();
        assert!(matches!(
            block_on(wf.upload_file(file())),
            Err(Error::InvalidTransition { .. })
        ));

        wf.reset();
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert!(matches!(block_on(wf.upload_file(file())), Ok(UploadOutcome::Done(_))));
    }
}
