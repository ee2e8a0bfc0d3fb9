//! 解析結果の受け渡し
//!
//! アップロード画面から結果画面へ、ページ遷移をまたいで1件だけ結果を渡す。
//! ブラウザでは sessionStorage、CLIではメモリ上のストアを使う。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::warn;

use crate::error::Result;
use crate::types::AnalysisResult;

/// 文字列キー/値のストア
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str);
}

/// メモリ上のストア
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

impl<S: SessionStore + ?Sized> SessionStore for Rc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

/// 解析結果1件分のセッション
#[derive(Debug, Clone, Default)]
pub struct AnalysisSession<S> {
    store: S,
}

impl<S: SessionStore> AnalysisSession<S> {
    pub const STORAGE_KEY: &'static str = "analysisData";

    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 結果を保存（既存の結果は上書き）
    pub fn put(&self, result: &AnalysisResult) -> Result<()> {
        let json = serde_json::to_string(result)?;
        self.store.set(Self::STORAGE_KEY, &json)
    }

    /// 結果を取り出して削除する。2回目以降は None
    pub fn take(&self) -> Option<AnalysisResult> {
        let result = self.peek();
        self.clear();
        result
    }

    /// 削除せずに読む。壊れたデータは削除して None
    pub fn peek(&self) -> Option<AnalysisResult> {
        let json = self.store.get(Self::STORAGE_KEY)?;
        match serde_json::from_str(&json) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, "保存された解析結果を読めないため破棄");
                self.clear();
                None
            }
        }
    }

    pub fn clear(&self) {
        self.store.remove(Self::STORAGE_KEY);
    }
}
