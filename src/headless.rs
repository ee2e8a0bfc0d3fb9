//! カメラを持たない環境（CLI）用のメディア実装

use reelkix_common::{
    CameraConstraints, CameraError, ImageUpload, MediaBackend, MediaDeviceEntry, TrackSettings,
};
use std::convert::Infallible;

/// 常に「カメラなし」を返す
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessMedia;

impl MediaBackend for HeadlessMedia {
    type Stream = Infallible;

    async fn open(&self, _constraints: &CameraConstraints) -> Result<Infallible, CameraError> {
        Err(CameraError::DeviceNotFound)
    }

    async fn enumerate(&self) -> Result<Vec<MediaDeviceEntry>, CameraError> {
        Ok(Vec::new())
    }

    fn settings(&self, stream: &Infallible) -> Option<TrackSettings> {
        match *stream {}
    }

    async fn grab_frame(&self, stream: &Infallible) -> Result<ImageUpload, CameraError> {
        match *stream {}
    }

    fn release(&self, stream: &Infallible) {
        match *stream {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use reelkix_common::CameraService;

    #[test]
    fn test_headless_has_no_camera() {
        let camera = CameraService::new(HeadlessMedia);
        let err = block_on(camera.start(&CameraConstraints::back_camera())).unwrap_err();
        assert_eq!(err, CameraError::DeviceNotFound);
        assert!(!camera.is_active());
        assert!(camera.devices().is_empty());
    }
}
