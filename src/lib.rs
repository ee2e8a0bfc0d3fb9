//! Reelkix CLI
//!
//! 画像ファイルを解析APIへ送り、結果を端末に表示する

pub mod cli;
pub mod config;
pub mod error;
pub mod headless;
pub mod image_prep;
pub mod report;
pub mod uploader;

use headless::HeadlessMedia;
use reelkix_common::{AnalysisSession, MemoryStore, UploadWorkflow};
use report::ConsoleNotifier;
use uploader::HttpUploader;

/// CLIで使うワークフロー（カメラなし、メモリ上のセッション）
pub type CliWorkflow = UploadWorkflow<HeadlessMedia, HttpUploader, MemoryStore, ConsoleNotifier>;

pub fn cli_workflow(uploader: HttpUploader) -> CliWorkflow {
    UploadWorkflow::new(
        HeadlessMedia,
        uploader,
        AnalysisSession::new(MemoryStore::new()),
        ConsoleNotifier,
    )
}
