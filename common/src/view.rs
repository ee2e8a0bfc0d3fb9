//! 結果画面の表示モデル

use crate::session::{AnalysisSession, SessionStore};
use crate::types::{AnalysisResult, ShoeAnalysis};

/// 結果の本文
#[derive(Debug, Clone, PartialEq)]
pub enum ResultBody {
    /// ラベル付きの構造化フィールド
    Structured(Vec<(&'static str, String)>),
    /// 自由記述のフォールバック
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub image_url: String,
    pub analysis: ShoeAnalysis,
}

impl ResultsView {
    /// セッションから結果を取り出す（読んだ時点で削除）。
    /// None ならアップロード画面へ戻す
    pub fn from_session<S: SessionStore>(session: &AnalysisSession<S>) -> Option<Self> {
        session.take().map(Self::from)
    }

    pub fn body(&self) -> ResultBody {
        if self.analysis.has_structured_data() {
            ResultBody::Structured(self.analysis.fields())
        } else {
            ResultBody::Text(self.analysis.text.clone())
        }
    }
}

impl From<AnalysisResult> for ResultsView {
    fn from(result: AnalysisResult) -> Self {
        Self {
            image_url: result.image_url,
            analysis: result.analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStore;
    use crate::testing::sample_result;

    #[test]
    fn test_from_session_consumes() {
        let session = AnalysisSession::new(MemoryStore::new());
        session.put(&sample_result()).unwrap();

        let view = ResultsView::from_session(&session).expect("結果がない");
        assert_eq!(view.image_url, sample_result().image_url);
        assert!(ResultsView::from_session(&session).is_none());
    }

    #[test]
    fn test_structured_body() {
        let view = ResultsView::from(sample_result());
        match view.body() {
            ResultBody::Structured(fields) => {
                assert_eq!(fields[0], ("Brand", "Nike".to_string()));
                assert_eq!(fields.len(), 5);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_text_fallback() {
        let mut result = sample_result();
        result.analysis = ShoeAnalysis {
            text: "A grey running shoe,\nbrand unclear".to_string(),
            confidence: 0.3,
            ..Default::default()
        };
        let view = ResultsView::from(result);
        assert_eq!(view.body(), ResultBody::Text("A grey running shoe,\nbrand unclear".to_string()));
    }
}
