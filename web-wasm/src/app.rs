//! メインアプリケーションコンポーネント

use std::rc::Rc;

use leptos::prelude::*;
use reelkix_common::{
    AnalysisSession, ClientSettings, Notification, Notifier, ResultsView, UploadWorkflow,
};

use wasm_bindgen::JsValue;

use crate::api::FetchUploader;
use crate::components::{
    header::Header, results_page::ResultsPage, toast::Toast, upload_page::UploadPage,
};
use crate::media::BrowserMedia;
use crate::storage::BrowserSessionStore;

pub type BrowserWorkflow =
    UploadWorkflow<BrowserMedia, FetchUploader, BrowserSessionStore, ToastNotifier>;

/// 表示中の画面
#[derive(Clone)]
pub enum Route {
    Upload,
    Results(ResultsView),
}

/// 通知をトーストに出す
#[derive(Clone, Copy)]
pub struct ToastNotifier {
    set_notification: WriteSignal<Option<Notification>>,
}

impl ToastNotifier {
    pub fn new(set_notification: WriteSignal<Option<Notification>>) -> Self {
        Self { set_notification }
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, notification: Notification) {
        web_sys::console::warn_1(&JsValue::from_str(&notification.message));
        self.set_notification.try_set(Some(notification));
    }
}

#[component]
pub fn App() -> impl IntoView {
    let settings = ClientSettings::from_overrides(option_env!("REELKIX_API_URL"));
    let (route, set_route) = signal(Route::Upload);
    let (notification, set_notification) = signal(None::<Notification>);
    let notifier = ToastNotifier::new(set_notification);

    let workflow: StoredValue<Rc<BrowserWorkflow>, LocalStorage> =
        StoredValue::new_local(Rc::new(UploadWorkflow::new(
            BrowserMedia::new(),
            FetchUploader::new(&settings.api_url),
            AnalysisSession::new(BrowserSessionStore),
            notifier,
        )));

    on_cleanup(move || {
        workflow.try_with_value(|wf| wf.teardown());
    });

    // 結果はセッションから1度だけ読む。なければアップロード画面のまま
    let show_results = move || {
        match ResultsView::from_session(&AnalysisSession::new(BrowserSessionStore)) {
            Some(results) => set_route.set(Route::Results(results)),
            None => set_route.set(Route::Upload),
        }
    };

    // "Analyze Another Shoe"
    let go_upload = move || {
        if !matches!(route.get_untracked(), Route::Upload) {
            workflow.with_value(|wf| wf.reset());
            set_route.set(Route::Upload);
        }
    };

    view! {
        <Header links=settings.social_links on_home=go_upload />

        <main class="container">
            {move || match route.get() {
                Route::Upload => view! {
                    <UploadPage workflow=workflow on_done=show_results />
                }
                .into_any(),
                Route::Results(results) => view! {
                    <ResultsPage results=results on_back=go_upload />
                }
                .into_any(),
            }}
        </main>

        <Toast notification=notification set_notification=set_notification />
    }
}
