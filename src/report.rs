//! 端末への結果表示と通知

use reelkix_common::{Notification, NotificationLevel, Notifier, ResultBody, ResultsView, SocialLinks};
use std::fmt::Write as _;

/// 通知を標準エラーに出す
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => eprintln!("✖ {}", notification.message),
            NotificationLevel::Info => eprintln!("ℹ {}", notification.message),
        }
    }
}

/// 結果画面のテキスト表現
pub fn render_results(view: &ResultsView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Analysis Results");
    if !view.image_url.is_empty() {
        let _ = writeln!(out, "  Image: {}", view.image_url);
    }

    match view.body() {
        ResultBody::Structured(fields) => {
            let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
            for (label, value) in fields {
                let _ = writeln!(out, "  {:width$} : {}", label, value, width = width);
            }
        }
        ResultBody::Text(text) => {
            for line in text.lines() {
                let _ = writeln!(out, "  {}", line);
            }
        }
    }

    out
}

pub fn render_social_links(links: &SocialLinks) -> String {
    links
        .entries()
        .into_iter()
        .map(|(name, url)| format!("  {}: {}", name, url))
        .collect::<Vec<_>>()
        .join("\n")
}
