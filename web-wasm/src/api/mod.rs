//! 解析API

pub mod upload;

pub use upload::FetchUploader;
