//! Content scoring for retrieved pages

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sources scoring below this are left out of a report
pub const MIN_RELEVANCE: u8 = 5;

/// Judgement of one piece of content against a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    /// 0-10
    pub relevance_score: u8,
    /// 0-10
    pub factuality_score: u8,
    /// The content with irrelevant parts removed
    pub filtered_content: String,
    pub analysis: String,
}

impl ContentAnalysis {
    pub fn is_relevant(&self) -> bool {
        self.relevance_score >= MIN_RELEVANCE
    }
}

/// Scores content for relevance and factuality.
///
/// Real scorers usually call out to a language model, so scoring is async.
#[async_trait]
pub trait ContentScorer: Send + Sync {
    async fn analyze(&self, query: &str, content: &str) -> ContentAnalysis;
}

/// Fixed scores; passes content through untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderScorer;

#[async_trait]
impl ContentScorer for PlaceholderScorer {
    async fn analyze(&self, _query: &str, content: &str) -> ContentAnalysis {
        ContentAnalysis {
            relevance_score: 7,
            factuality_score: 8,
            filtered_content: content.to_string(),
            analysis: "Placeholder analysis; no scoring model configured.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_scorer() {
        let analysis = PlaceholderScorer.analyze("rust", "Rust is fast.").await;
        assert_eq!(analysis.relevance_score, 7);
        assert_eq!(analysis.factuality_score, 8);
        assert_eq!(analysis.filtered_content, "Rust is fast.");
        assert!(analysis.is_relevant());
    }

    #[test]
    fn test_scorer_as_trait_object() {
        let scorer: Box<dyn ContentScorer> = Box::new(PlaceholderScorer);
        let analysis = tokio_test::block_on(scorer.analyze("rust", ""));
        assert_eq!(analysis.filtered_content, "");
        assert_eq!(analysis.relevance_score, MIN_RELEVANCE + 2);
    }
}
