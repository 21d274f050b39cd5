//! Sequence-to-sequence summarization model.
//!
//! The pipeline only sees the [`ChunkSummarizer`] and [`TokenCounter`]
//! traits; [`T5Summarizer`] is the production implementation backed by
//! candle. It is built once at startup and shared by reference.

pub mod beam;
pub mod config;
pub mod t5;

pub use config::ModelConfig;
pub use t5::T5Summarizer;

use thiserror::Error;

pub const MODEL_URL: &str = "https://huggingface.co/t5-base/resolve/main/model.safetensors";
pub const CONFIG_URL: &str = "https://huggingface.co/t5-base/resolve/main/config.json";
pub const TOKENIZER_URL: &str = "https://huggingface.co/t5-base/resolve/main/tokenizer.json";

/// Decoding settings for one model invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Upper bound on generated tokens.
    pub max_tokens: usize,
    /// End-of-sequence is suppressed until this many tokens are generated.
    pub min_tokens: usize,
    pub beam_count: usize,
    /// Exponent applied to hypothesis length when ranking beams; values
    /// above 1.0 favor longer output.
    pub length_penalty: f64,
    /// 1.0 disables the penalty.
    pub repetition_penalty: f32,
    /// 0 disables the n-gram ban.
    pub no_repeat_ngram_size: usize,
}

/// Failure inside a model invocation. Always fatal for the request.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("tokenizer failure: {0}")]
    Tokenizer(#[source] tokenizers::Error),
    #[error("model inference failed: {0}")]
    Inference(#[from] candle_core::Error),
    #[error("model lock poisoned by an earlier panic")]
    Poisoned,
}

/// Counts model tokens, the unit the chunk ceiling is expressed in.
pub trait TokenCounter {
    fn count_tokens(&self, text: &str) -> usize;
}

/// Produces an abstractive summary of a single chunk.
pub trait ChunkSummarizer {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String, GenerationError>;
}

/// Downloads missing model files, then loads the summarizer on a blocking
/// worker. Loading reads several hundred megabytes of weights.
pub async fn load_summarizer(
    model_config: ModelConfig,
    instruction_prefix: String,
    max_input_tokens: usize,
) -> anyhow::Result<std::sync::Arc<T5Summarizer>> {
    model_config.ensure_models_exist().await?;
    let summarizer = tokio::task::spawn_blocking(move || {
        T5Summarizer::load(&model_config, &instruction_prefix, max_input_tokens)
    })
    .await??;
    Ok(std::sync::Arc::new(summarizer))
}
