use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::chunker::chunk_text;
use super::cleaner::clean_summary;
use super::config::{ReductionStrategy, SummarizerConfig, SummaryTier};
use super::error::SummarizeError;
use crate::model::{ChunkSummarizer, TokenCounter};
use crate::{word_count, TARGET_PIPELINE};

/// Result of summarizing every chunk of one input (or stopping early).
struct Pass {
    text: String,
    words: usize,
}

/// Drives chunking, per-chunk summarization and length control for one
/// model. Holds only borrowed state, so it is cheap to build per request.
pub struct Summarizer<'a, M: ?Sized> {
    model: &'a M,
    config: &'a SummarizerConfig,
}

impl<'a, M> Summarizer<'a, M>
where
    M: ChunkSummarizer + TokenCounter + ?Sized,
{
    pub fn new(model: &'a M, config: &'a SummarizerConfig) -> Self {
        Self { model, config }
    }

    /// Summarizes `text` down to at most `target_words` words.
    ///
    /// Chunks are summarized in order and processing stops as soon as the
    /// partial summaries reach `target_words * early_stop_multiplier` words,
    /// so trailing chunks may never be read. A combined summary below
    /// `target_words * quality_floor_multiplier` is rejected instead of
    /// returned.
    pub fn summarize_long_text(
        &self,
        text: &str,
        target_words: usize,
    ) -> Result<String, SummarizeError> {
        if target_words == 0 {
            return Err(SummarizeError::ZeroTarget);
        }

        let started = Instant::now();
        let tier = self.config.tier_for(target_words);
        info!(target: TARGET_PIPELINE,
            "Summarizing {} words to {} words with the {} tier ({} strategy)",
            word_count(text),
            target_words,
            tier.kind,
            self.config.strategy
        );

        let mut input: Cow<'_, str> = Cow::Borrowed(text);
        let mut depth = 0;

        loop {
            let pass = self.run_pass(&input, target_words, tier)?;
            if let Err(e) = self.check_quality_floor(&pass, target_words) {
                if depth == 0 {
                    return Err(e);
                }
                // The previous pass met the floor and exceeded the target.
                warn!(target: TARGET_PIPELINE,
                    "Pass {} overshot to {} words, trimming the previous pass instead",
                    depth + 1,
                    pass.words
                );
                let trimmed = truncate_words(&input, target_words);
                return Ok(self.finish(&trimmed, started, depth));
            }

            if pass.words <= target_words {
                return Ok(self.finish(&pass.text, started, depth));
            }

            let summarize_again = match self.config.strategy {
                ReductionStrategy::Trim => false,
                ReductionStrategy::Recursive => {
                    let input_words = word_count(&input);
                    if depth + 1 >= self.config.max_depth {
                        warn!(target: TARGET_PIPELINE,
                            "Reached maximum depth {} with {} words left, trimming instead",
                            self.config.max_depth,
                            pass.words
                        );
                        false
                    } else if pass.words >= input_words {
                        warn!(target: TARGET_PIPELINE,
                            "Pass {} did not shrink the text ({} -> {} words), trimming instead",
                            depth + 1,
                            input_words,
                            pass.words
                        );
                        false
                    } else {
                        true
                    }
                }
            };

            if !summarize_again {
                debug!(target: TARGET_PIPELINE,
                    "Trimming combined summary from {} to {} words",
                    pass.words,
                    target_words
                );
                let trimmed = truncate_words(&pass.text, target_words);
                return Ok(self.finish(&trimmed, started, depth));
            }

            debug!(target: TARGET_PIPELINE,
                "Combined summary has {} words, summarizing again (pass {})",
                pass.words,
                depth + 2
            );
            depth += 1;
            input = Cow::Owned(pass.text);
        }
    }

    fn run_pass(
        &self,
        text: &str,
        target_words: usize,
        tier: &SummaryTier,
    ) -> Result<Pass, SummarizeError> {
        let trimmed = text.trim();
        let chars = trimmed.chars().count();
        if chars < self.config.min_input_chars {
            warn!(target: TARGET_PIPELINE,
                "Rejecting input of {} characters (minimum {})",
                chars,
                self.config.min_input_chars
            );
            return Err(SummarizeError::Input {
                chars,
                min_chars: self.config.min_input_chars,
            });
        }

        let chunks = chunk_text(trimmed, tier.chunk_tokens, self.model);
        // Unreachable while the splitter falls back to the whole text.
        if chunks.is_empty() {
            error!(target: TARGET_PIPELINE, "!!! No chunks produced from {} characters of input", chars);
            return Err(SummarizeError::Chunking { chars });
        }

        let early_stop = target_words as f64 * self.config.early_stop_multiplier;
        let mut partials: Vec<String> = Vec::with_capacity(chunks.len());
        let mut accumulated = 0;

        for (index, chunk) in chunks.iter().enumerate() {
            let chunk_started = Instant::now();
            let summary = self
                .model
                .summarize(&chunk.text(), &tier.generation)
                .map_err(|e| {
                    error!(target: TARGET_PIPELINE,
                        "!!! Chunk {}/{} failed: {}",
                        index + 1,
                        chunks.len(),
                        e
                    );
                    SummarizeError::from(e)
                })?;

            let words = word_count(&summary);
            accumulated += words;
            debug!(target: TARGET_PIPELINE,
                "Chunk {}/{}: {} tokens -> {} words in {:?} ({} words so far)",
                index + 1,
                chunks.len(),
                chunk.token_count,
                words,
                chunk_started.elapsed(),
                accumulated
            );

            let summary = summary.trim();
            if !summary.is_empty() {
                partials.push(summary.to_string());
            }

            if accumulated as f64 >= early_stop {
                if index + 1 < chunks.len() {
                    info!(target: TARGET_PIPELINE,
                        "Stopping after {}/{} chunks: {} words reached the {:.0}-word limit",
                        index + 1,
                        chunks.len(),
                        accumulated,
                        early_stop
                    );
                }
                break;
            }
        }

        let text = partials.join(" ");
        let words = word_count(&text);
        Ok(Pass { text, words })
    }

    fn check_quality_floor(&self, pass: &Pass, target_words: usize) -> Result<(), SummarizeError> {
        let floor = target_words as f64 * self.config.quality_floor_multiplier;
        if (pass.words as f64) < floor {
            warn!(target: TARGET_PIPELINE,
                "Combined summary of {} words is below the {:.0}-word floor",
                pass.words,
                floor
            );
            return Err(SummarizeError::Quality {
                words: pass.words,
                floor,
                target: target_words,
            });
        }
        Ok(())
    }

    fn finish(&self, text: &str, started: Instant, depth: usize) -> String {
        let summary = clean_summary(text);
        info!(target: TARGET_PIPELINE,
            "Produced a {}-word summary in {:?} after {} pass(es)",
            word_count(&summary),
            started.elapsed(),
            depth + 1
        );
        summary
    }
}

/// The first `limit` words of `text`, single-space separated.
fn truncate_words(text: &str, limit: usize) -> String {
    text.split_whitespace()
        .take(limit)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs [`Summarizer::summarize_long_text`] on a blocking worker so the
/// calling task stays responsive, giving up after `limit`.
///
/// The worker cannot be interrupted; on timeout its eventual result is
/// discarded. A [`SummarizeError`] can be recovered with `downcast_ref`.
pub async fn summarize_in_background<M>(
    model: Arc<M>,
    config: Arc<SummarizerConfig>,
    text: String,
    target_words: usize,
    limit: Duration,
) -> anyhow::Result<String>
where
    M: ChunkSummarizer + TokenCounter + Send + Sync + 'static,
{
    let handle = tokio::task::spawn_blocking(move || {
        Summarizer::new(model.as_ref(), &config).summarize_long_text(&text, target_words)
    });

    match timeout(limit, handle).await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(join_error)) => Err(anyhow::anyhow!(
            "Summarization worker failed: {}",
            join_error
        )),
        Err(_) => {
            warn!(target: TARGET_PIPELINE, "Summarization did not finish within {:?}", limit);
            Err(anyhow::anyhow!("Summarization timed out after {:?}", limit))
        }
    }
}
