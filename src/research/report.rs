//! Cited research reports

use super::scoring::{ContentAnalysis, ContentScorer};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Characters of preceding text kept for each citation
const CITATION_CONTEXT: usize = 100;

pub const NO_RELEVANT_RESULTS: &str = "I couldn't find relevant information for your query. \
Could you try rephrasing or providing more details?";

static CITATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d+)\]").expect("citation pattern is valid"));

/// A source URL with its analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedSource {
    pub url: String,
    pub analysis: ContentAnalysis,
}

/// Score every `(url, content)` pair concurrently, keeping input order
pub async fn analyze_sources(
    scorer: &dyn ContentScorer,
    query: &str,
    sources: &[(String, String)],
) -> Vec<AnalyzedSource> {
    let analyses = futures::future::join_all(
        sources
            .iter()
            .map(|(_, content)| scorer.analyze(query, content)),
    )
    .await;

    sources
        .iter()
        .zip(analyses)
        .map(|((url, _), analysis)| AnalyzedSource {
            url: url.clone(),
            analysis,
        })
        .collect()
}

/// Render relevant sources as numbered paragraphs followed by a source list
pub fn format_research_results(sources: &[AnalyzedSource]) -> String {
    let relevant: Vec<&AnalyzedSource> = sources.iter().filter(|s| s.analysis.is_relevant()).collect();
    if relevant.is_empty() {
        return NO_RELEVANT_RESULTS.to_string();
    }

    let mut paragraphs = Vec::new();
    let mut citations = Vec::new();
    for (i, source) in relevant.iter().enumerate() {
        let n = i + 1;
        citations.push(format!("[{}] {}", n, source.url));
        if !source.analysis.filtered_content.is_empty() {
            paragraphs.push(format!("{} [{}]", source.analysis.filtered_content, n));
        }
    }

    format!("{}\n\nSources:\n{}", paragraphs.join("\n\n"), citations.join("\n"))
}

/// A `[n]` marker and the text it follows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub number: u32,
    pub text: String,
}

/// Find `[n]` markers along with up to 100 characters of preceding text
pub fn extract_citations(text: &str) -> Vec<Citation> {
    CITATION_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let marker = caps.get(0)?;
            let number = caps.get(1)?.as_str().parse().ok()?;

            let before = &text[..marker.start()];
            let skip = before.chars().count().saturating_sub(CITATION_CONTEXT);
            let window: String = before.chars().skip(skip).collect();
            let cited = window.trim();

            let text = if skip > 0 {
                format!("...{cited}")
            } else {
                cited.to_string()
            };
            Some(Citation { number, text })
        })
        .collect()
}
