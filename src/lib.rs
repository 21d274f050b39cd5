pub mod environment;
pub mod logging;
pub mod model;
pub mod summarize;
pub mod wiki;

pub const TARGET_WIKI_REQUEST: &str = "wiki_request";
pub const TARGET_MODEL: &str = "model_inference";
pub const TARGET_PIPELINE: &str = "summarize";

pub use model::{ChunkSummarizer, GenerationError, TokenCounter};
pub use summarize::{
    describe_failure, ReductionStrategy, SummarizeError, Summarizer, SummarizerConfig, SummaryTier,
};
pub use wiki::{Article, FetchError};

/// Number of whitespace-separated words in `text`. Summary lengths are
/// accounted in words, not model tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
