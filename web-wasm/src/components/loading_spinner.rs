//! 解析中インジケータ

use leptos::prelude::*;

#[component]
pub fn LoadingSpinner() -> impl IntoView {
    view! {
        <div class="loading">
            <div class="spinner" />
            <p class="text-muted">"Analyzing..."</p>
        </div>
    }
}
