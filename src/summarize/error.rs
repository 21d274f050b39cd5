use thiserror::Error;

use crate::model::GenerationError;

/// Why a summarization request failed. Every variant is fatal for the request
/// and none is retried.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("input too short to summarize: {chars} characters after trimming, need at least {min_chars}")]
    Input { chars: usize, min_chars: usize },
    #[error("target length must be at least one word")]
    ZeroTarget,
    /// Non-empty input produced no chunks. Indicates a bug in the chunker.
    #[error("chunking produced no chunks from {chars} characters of input")]
    Chunking { chars: usize },
    #[error("summarization engine failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("content too sparse to summarize: generated {words} words, need at least {floor:.0} for a {target}-word summary")]
    Quality {
        words: usize,
        floor: f64,
        target: usize,
    },
}

/// One-line explanation of a failed request for the command-line front ends.
pub fn describe_failure(err: &anyhow::Error) -> String {
    match err.downcast_ref::<SummarizeError>() {
        Some(SummarizeError::Quality { .. }) => format!(
            "The article is too sparse to produce a summary of that length ({}). \
             Try a shorter target.",
            err
        ),
        Some(SummarizeError::Generation(source)) => {
            format!("The summarization engine failed: {}", source)
        }
        Some(SummarizeError::Input { .. }) => format!("Nothing to summarize: {}", err),
        Some(other) => other.to_string(),
        None => format!("Summarization failed: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_are_explained_by_kind() {
        let sparse = anyhow::Error::from(SummarizeError::Quality {
            words: 40,
            floor: 120.0,
            target: 150,
        });
        assert!(describe_failure(&sparse).starts_with("The article is too sparse"));
        assert!(describe_failure(&sparse).contains("generated 40 words"));

        let engine = anyhow::Error::from(SummarizeError::Generation(GenerationError::Poisoned));
        assert_eq!(
            describe_failure(&engine),
            "The summarization engine failed: model lock poisoned by an earlier panic"
        );

        let timeout = anyhow::anyhow!("Summarization timed out after 5s");
        assert_eq!(
            describe_failure(&timeout),
            "Summarization failed: Summarization timed out after 5s"
        );
    }
}
