//! Query handling module
//!
//! Decides when two free-text queries are the same logical query and
//! screens out input that is not worth sending to a search provider:
//! - Similarity: token-overlap (Jaccard) with length-dependent thresholds
//! - Validation: empty, emoji-only, bare-number and gibberish rejection

mod similarity;
mod validate;

pub use similarity::{jaccard, normalize_terms, similar, STOP_WORDS};
pub use validate::is_valid_query;
