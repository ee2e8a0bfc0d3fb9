//! 結果画面

use leptos::prelude::*;
use reelkix_common::{ResultBody, ResultsView};

#[component]
pub fn ResultsPage<F>(results: ResultsView, on_back: F) -> impl IntoView
where
    F: Fn() + 'static,
{
    let body = match results.body() {
        ResultBody::Structured(fields) => fields
            .into_iter()
            .map(|(label, value)| {
                view! {
                    <p><span class="label">{label}":"</span>" "{value}</p>
                }
            })
            .collect_view()
            .into_any(),
        ResultBody::Text(text) => view! { <p class="pre-line">{text}</p> }.into_any(),
    };

    view! {
        <div class="results">
            <div class="card">
                <img src=results.image_url class="result-image" alt="Uploaded shoe" />
                <h2 class="accent">"Analysis Results"</h2>
                {body}
            </div>
            <div class="actions">
                <button class="btn btn-primary" on:click=move |_| on_back()>
                    "Analyze Another Shoe"
                </button>
            </div>
        </div>
    }
}
