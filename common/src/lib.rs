//! Reelkix Common Library
//!
//! CLIとWeb(WASM)で共有される型・カメラ制御・アップロードワークフロー

pub mod types;
pub mod error;
pub mod device;
pub mod camera;
pub mod upload;
pub mod session;
pub mod notification;
pub mod settings;
pub mod view;
pub mod workflow;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use types::{AnalysisResult, ImageUpload, ProblemDetails, ShoeAnalysis};
pub use error::{CameraError, Error, Result, UploadError};
pub use device::{
    build_device_list, find_back_camera, DeviceDescriptor, DeviceKind, FacingMode,
    MediaDeviceEntry, TrackSettings,
};
pub use camera::{CameraConstraints, CameraService, MediaBackend};
pub use upload::{parse_upload_response, upload_url, Uploader, UPLOAD_FIELD};
pub use session::{AnalysisSession, MemoryStore, SessionStore};
pub use notification::{Notification, NotificationLevel, Notifier};
pub use settings::{ClientSettings, SocialLinks, DEFAULT_API_URL};
pub use view::{ResultBody, ResultsView};
pub use workflow::{Teardown, UploadOutcome, UploadWorkflow, Workflow, WorkflowState};
