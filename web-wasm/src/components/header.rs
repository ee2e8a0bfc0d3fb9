//! ヘッダーコンポーネント

use leptos::prelude::*;
use reelkix_common::SocialLinks;

#[component]
pub fn Header<F>(links: SocialLinks, on_home: F) -> impl IntoView
where
    F: Fn() + 'static,
{
    let links = links
        .entries()
        .into_iter()
        .map(|(name, url)| {
            let url = url.to_string();
            view! { <a href=url target="_blank" rel="noopener noreferrer">{name}</a> }
        })
        .collect_view();

    view! {
        <header class="header">
            <h1>"Reelkix " <span class="accent">"Vision"</span></h1>
            <nav class="nav">
                <a href="#" on:click=move |ev| {
                    ev.prevent_default();
                    on_home();
                }>"Upload"</a>
                {links}
            </nav>
        </header>
    }
}
