//! アップロード画面（カメラ撮影 / ファイル選択）

use std::rc::Rc;

use leptos::html::Video;
use leptos::prelude::*;
use leptos::task::spawn_local;
use reelkix_common::{Error, ImageUpload, Notification, Notifier, UploadOutcome, WorkflowState};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::File;

use crate::app::BrowserWorkflow;
use crate::components::loading_spinner::LoadingSpinner;
use crate::components::upload_area::UploadArea;

/// File の中身を読み込む
async fn read_file(file: &File) -> Result<ImageUpload, JsValue> {
    let buffer = JsFuture::from(file.array_buffer()).await?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    let mime_type = match file.type_() {
        t if t.is_empty() => "application/octet-stream".to_string(),
        t => t,
    };
    Ok(ImageUpload::new(bytes, file.name(), mime_type))
}

fn log_error(error: &Error) {
    // 中断や通知済みのエラーはコンソールのみ
    if !matches!(error, Error::Cancelled) {
        web_sys::console::error_1(&JsValue::from_str(&error.to_string()));
    }
}

#[component]
pub fn UploadPage<F>(workflow: StoredValue<Rc<BrowserWorkflow>, LocalStorage>, on_done: F) -> impl IntoView
where
    F: Fn() + Clone + Send + Sync + 'static,
{
    let (state, set_state) = signal(workflow.with_value(|wf| wf.state()));
    let (device_count, set_device_count) = signal(0usize);
    let video_ref = NodeRef::<Video>::new();

    // 画面破棄後に届いた完了通知は無視される
    let sync = move |wf: &BrowserWorkflow| {
        set_state.try_set(wf.state());
        set_device_count.try_set(wf.camera().devices().len());
    };

    Effect::new(move |_| {
        if let Some(video) = video_ref.get() {
            workflow.with_value(|wf| wf.camera().backend().attach_preview(video));
        }
    });

    // 画面を離れるときはカメラだけ解放する
    on_cleanup(move || {
        workflow.try_with_value(|wf| wf.stop_camera());
    });

    let finish_upload = move |wf: &BrowserWorkflow, outcome: reelkix_common::Result<UploadOutcome>| {
        sync(wf);
        match outcome {
            Ok(UploadOutcome::Done(_)) => true,
            Ok(_) => false,
            Err(e) => {
                log_error(&e);
                false
            }
        }
    };

    let on_toggle_camera = move |_| {
        let wf = workflow.get_value();
        if wf.state() == WorkflowState::CameraActive {
            wf.stop_camera();
            sync(&wf);
            return;
        }

        // プレビューを先に表示する
        set_state.set(WorkflowState::CameraActive);
        spawn_local(async move {
            let result = wf.start_camera().await;
            sync(&wf);
            if let Err(e) = result {
                log_error(&e);
            }
        });
    };

    let on_switch_camera = move |_| {
        let wf = workflow.get_value();
        spawn_local(async move {
            let result = wf.switch_camera().await;
            sync(&wf);
            if let Err(e) = result {
                log_error(&e);
            }
        });
    };

    let on_capture = {
        let on_done = on_done.clone();
        move |_| {
            let wf = workflow.get_value();
            let on_done = on_done.clone();
            set_state.set(WorkflowState::Uploading);
            spawn_local(async move {
                let outcome = wf.capture_and_upload().await;
                if finish_upload(&wf, outcome) {
                    on_done();
                }
            });
        }
    };

    let on_file = move |file: File| {
        let wf = workflow.get_value();
        if !file.type_().starts_with("image/") {
            wf.notifier().notify(Notification::error("Please select an image file."));
            return;
        }

        let on_done = on_done.clone();
        set_state.set(WorkflowState::Uploading);
        spawn_local(async move {
            let outcome = match read_file(&file).await {
                Ok(image) => wf.upload_file(image).await,
                Err(e) => {
                    web_sys::console::error_1(&e);
                    wf.notifier().notify(Notification::error("Failed to read the selected file."));
                    Ok(UploadOutcome::Stale)
                }
            };
            if finish_upload(&wf, outcome) {
                on_done();
            }
        });
    };

    let camera_active = move || state.get() == WorkflowState::CameraActive;
    let uploading = move || state.get() == WorkflowState::Uploading;

    view! {
        <div class="upload-page">
            <div class="camera">
                <video
                    node_ref=video_ref
                    class="camera-preview"
                    class:hidden=move || !camera_active()
                    playsinline=true
                />
                <div class="actions">
                    <button
                        class="btn"
                        disabled=uploading
                        on:click=on_toggle_camera
                    >
                        {move || if camera_active() { "Stop Camera" } else { "Use Camera" }}
                    </button>
                    <Show when=camera_active>
                        <button class="btn btn-primary" on:click=on_capture.clone()>"Capture"</button>
                        <Show when=move || { device_count.get() > 1 }>
                            <button class="btn" on:click=on_switch_camera>"Switch Camera"</button>
                        </Show>
                    </Show>
                </div>
            </div>

            <UploadArea disabled=Signal::derive(uploading) on_file=on_file />

            <Show when=uploading>
                <LoadingSpinner />
            </Show>
        </div>
    }
}
