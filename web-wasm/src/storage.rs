//! sessionStorage によるセッションストア

use reelkix_common::{Error, Result, SessionStore};
use web_sys::Storage;

/// タブを閉じると消える sessionStorage
#[derive(Clone, Default)]
pub struct BrowserSessionStore;

impl BrowserSessionStore {
    fn storage() -> Option<Storage> {
        web_sys::window()?.session_storage().ok().flatten()
    }
}

impl SessionStore for BrowserSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let storage = Self::storage()
            .ok_or_else(|| Error::Storage("sessionStorage が使えません".into()))?;
        storage
            .set_item(key, value)
            .map_err(|e| Error::Storage(format!("{:?}", e)))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use reelkix_common::{AnalysisResult, AnalysisSession};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn wasm_session_roundtrip_and_clear() {
        let session = AnalysisSession::new(BrowserSessionStore);
        let result = AnalysisResult {
            image_url: "https://cdn.example.com/a.jpg".to_string(),
            ..Default::default()
        };

        session.put(&result).expect("保存失敗");
        assert_eq!(session.take().map(|r| r.image_url), Some(result.image_url));
        assert!(session.peek().is_none());
    }
}
