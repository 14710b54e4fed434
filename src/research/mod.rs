//! Research helpers built on top of search results
//!
//! Content scoring is a pluggable capability; the dispatcher never calls it.

mod report;
mod scoring;

pub use report::{
    analyze_sources, extract_citations, format_research_results, AnalyzedSource, Citation,
    NO_RELEVANT_RESULTS,
};
pub use scoring::{ContentAnalysis, ContentScorer, PlaceholderScorer, MIN_RELEVANCE};
