//! fetch + FormData による画像アップロード

use reelkix_common::{
    parse_upload_response, upload_url, AnalysisResult, ImageUpload, UploadError, Uploader,
    UPLOAD_FIELD,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, FormData, Request, RequestInit, RequestMode, Response};

pub struct FetchUploader {
    endpoint: String,
}

fn network_error(err: JsValue) -> UploadError {
    UploadError::Network(
        err.as_string()
            .unwrap_or_else(|| format!("{:?}", err)),
    )
}

impl FetchUploader {
    pub fn new(api_url: &str) -> Self {
        Self {
            endpoint: upload_url(api_url),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(image: &ImageUpload) -> Result<FormData, JsValue> {
        let bytes = js_sys::Uint8Array::from(image.bytes.as_slice());
        let options = BlobPropertyBag::new();
        options.set_type(&image.mime_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&js_sys::Array::of1(&bytes), &options)?;

        let form = FormData::new()?;
        form.append_with_blob_and_filename(UPLOAD_FIELD, &blob, &image.file_name)?;
        Ok(form)
    }

    async fn send(&self, image: &ImageUpload) -> Result<(u16, String), JsValue> {
        let options = RequestInit::new();
        options.set_method("POST");
        options.set_mode(RequestMode::Cors);
        // Content-Type（boundary 付き）はブラウザに任せる
        options.set_body(&Self::form(image)?.into());

        let request = Request::new_with_str_and_init(&self.endpoint, &options)?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("window がありません"))?;
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await?
            .dyn_into()?;

        let body = JsFuture::from(response.text()?).await?;
        Ok((response.status(), body.as_string().unwrap_or_default()))
    }
}

impl Uploader for FetchUploader {
    async fn upload(&self, image: &ImageUpload) -> Result<AnalysisResult, UploadError> {
        let (status, body) = self.send(image).await.map_err(network_error)?;
        parse_upload_response(status, &body)
    }
}
