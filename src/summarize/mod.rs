//! Recursive chunked summarization.
//!
//! Long text is split into sentence-aligned chunks that fit the model's
//! encoder, each chunk is summarized, and the partial summaries are joined
//! and brought down to the requested word count.

pub mod chunker;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod sentence;

pub use chunker::{chunk_text, Chunk};
pub use cleaner::clean_summary;
pub use config::{ConfigError, ReductionStrategy, SummarizerConfig, SummaryTier, TierKind};
pub use error::{describe_failure, SummarizeError};
pub use pipeline::{summarize_in_background, Summarizer};
pub use sentence::split_sentences;
