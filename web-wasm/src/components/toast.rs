//! 一時通知（数秒で自動的に閉じる）

use gloo::timers::callback::Timeout;
use leptos::prelude::*;
use reelkix_common::{Notification, NotificationLevel};

#[component]
pub fn Toast(
    notification: ReadSignal<Option<Notification>>,
    set_notification: WriteSignal<Option<Notification>>,
) -> impl IntoView {
    // 新しい通知が来たら前のタイマーは drop で取り消される
    let timer = StoredValue::new_local(None::<Timeout>);

    Effect::new(move |_| {
        let duration = notification.with(|n| n.as_ref().map(|n| n.duration_ms));
        let next = duration.map(|ms| Timeout::new(ms, move || set_notification.set(None)));
        timer.set_value(next);
    });

    let field = move |f: fn(&Notification) -> String| {
        notification.with(|n| n.as_ref().map(f).unwrap_or_default())
    };
    let class = move || {
        let level = notification.with(|n| n.as_ref().map(|n| n.level));
        match level {
            Some(NotificationLevel::Info) => "toast toast-info",
            _ => "toast toast-error",
        }
    };

    view! {
        <Show when=move || notification.with(|n| n.is_some())>
            <div class=class role="alert">
                <span>{move || field(|n| n.message.clone())}</span>
                <button on:click=move |_| set_notification.set(None)>
                    {move || field(|n| n.action.clone())}
                </button>
            </div>
        </Show>
    }
}
