//! 解析APIクライアント（reqwest multipart）

use crate::error::Result;
use reelkix_common::{
    parse_upload_response, upload_url, AnalysisResult, ImageUpload, UploadError, Uploader,
    UPLOAD_FIELD,
};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::debug;

pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUploader {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: upload_url(api_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(image: &ImageUpload) -> std::result::Result<Form, UploadError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|e| UploadError::InvalidInput(format!("invalid mime type {}: {}", image.mime_type, e)))?;
        Ok(Form::new().part(UPLOAD_FIELD, part))
    }
}

impl Uploader for HttpUploader {
    async fn upload(&self, image: &ImageUpload) -> std::result::Result<AnalysisResult, UploadError> {
        let form = Self::form(image)?;
        debug!(endpoint = %self.endpoint, bytes = image.len(), "POST");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;
        debug!(status, body_len = body.len(), "レスポンス受信");

        parse_upload_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_rejects_bad_mime_type() {
        let image = ImageUpload::new(vec![1, 2, 3], "shoe.jpg", "not a mime");
        let Err(err) = HttpUploader::form(&image) else {
            panic!("不正なMIMEタイプが通った");
        };
        assert!(matches!(err, UploadError::InvalidInput(_)));
        assert_eq!(err.user_message(), "Failed to analyze image. Please try again.");
    }

    #[test]
    fn test_form_accepts_image_mime_type() {
        let image = ImageUpload::new(vec![1, 2, 3], "shoe.jpg", "image/jpeg");
        assert!(HttpUploader::form(&image).is_ok());
    }
}
