use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::environment::{get_env_string_or, get_env_var_or};
use crate::model::GenerationParams;

/// Tokens kept free under the encoder limit for the instruction prefix and
/// the closing EOS token.
pub const PREFIX_TOKEN_MARGIN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    Small,
    Medium,
    Large,
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierKind::Small => write!(f, "small"),
            TierKind::Medium => write!(f, "medium"),
            TierKind::Large => write!(f, "large"),
        }
    }
}

/// Chunk size and decoding settings used for one size bucket of target
/// lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryTier {
    pub kind: TierKind,
    /// Model-token ceiling for a chunk.
    pub chunk_tokens: usize,
    pub generation: GenerationParams,
}

impl SummaryTier {
    fn with_env_overrides(self, name: &str) -> Self {
        let var = |field: &str| format!("WIKIBRIEF_{}_{}", name, field);
        let g = self.generation;
        Self {
            kind: self.kind,
            chunk_tokens: get_env_var_or(&var("CHUNK_TOKENS"), self.chunk_tokens),
            generation: GenerationParams {
                max_tokens: get_env_var_or(&var("MAX_TOKENS"), g.max_tokens),
                min_tokens: get_env_var_or(&var("MIN_TOKENS"), g.min_tokens),
                beam_count: get_env_var_or(&var("BEAMS"), g.beam_count),
                length_penalty: get_env_var_or(&var("LENGTH_PENALTY"), g.length_penalty),
                repetition_penalty: get_env_var_or(
                    &var("REPETITION_PENALTY"),
                    g.repetition_penalty,
                ),
                no_repeat_ngram_size: get_env_var_or(
                    &var("NO_REPEAT_NGRAM"),
                    g.no_repeat_ngram_size,
                ),
            },
        }
    }
}

/// How a combined summary that is still longer than the target is brought
/// down to size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReductionStrategy {
    /// Cut to the first `target` words, then drop the trailing fragment.
    #[default]
    Trim,
    /// Summarize the combined summary again until it fits, bounded by
    /// `max_depth` and a shrink check.
    Recursive,
}

impl FromStr for ReductionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trim" => Ok(ReductionStrategy::Trim),
            "recursive" => Ok(ReductionStrategy::Recursive),
            other => Err(format!(
                "unknown strategy '{}', expected 'trim' or 'recursive'",
                other
            )),
        }
    }
}

impl fmt::Display for ReductionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReductionStrategy::Trim => write!(f, "trim"),
            ReductionStrategy::Recursive => write!(f, "recursive"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{tier} tier chunk ceiling of {chunk_tokens} tokens leaves no room for the prefix under the {max_input_tokens}-token encoder limit")]
    ChunkTooLarge {
        tier: TierKind,
        chunk_tokens: usize,
        max_input_tokens: usize,
    },
    #[error("tier boundaries must be increasing, got small <= {small} and medium <= {medium}")]
    TierBounds { small: usize, medium: usize },
    #[error("{tier} tier must use at least one beam")]
    ZeroBeams { tier: TierKind },
    #[error("{tier} tier minimum length {min_tokens} exceeds maximum {max_tokens}")]
    LengthBounds {
        tier: TierKind,
        min_tokens: usize,
        max_tokens: usize,
    },
    #[error("quality floor multiplier {floor} must be positive and below the early-stop multiplier {early_stop}")]
    Multipliers { floor: f64, early_stop: f64 },
    #[error("recursion depth must be at least 1")]
    ZeroDepth,
}

/// Tunables of the chunked summarization pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizerConfig {
    /// Hard encoder limit; longer inputs are truncated by the model.
    pub max_input_tokens: usize,
    pub instruction_prefix: String,
    /// Targets up to this many words use the small tier.
    pub small_tier_max_words: usize,
    /// Targets up to this many words use the medium tier, above it large.
    pub medium_tier_max_words: usize,
    pub small: SummaryTier,
    pub medium: SummaryTier,
    pub large: SummaryTier,
    pub early_stop_multiplier: f64,
    pub quality_floor_multiplier: f64,
    /// Inputs shorter than this after trimming are rejected.
    pub min_input_chars: usize,
    pub strategy: ReductionStrategy,
    /// Maximum number of passes in the recursive strategy.
    pub max_depth: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: 512,
            instruction_prefix: "summarize: ".to_string(),
            small_tier_max_words: 1500,
            medium_tier_max_words: 3000,
            small: SummaryTier {
                kind: TierKind::Small,
                chunk_tokens: 400,
                generation: GenerationParams {
                    max_tokens: 150,
                    min_tokens: 50,
                    beam_count: 4,
                    length_penalty: 2.0,
                    repetition_penalty: 2.0,
                    no_repeat_ngram_size: 3,
                },
            },
            medium: SummaryTier {
                kind: TierKind::Medium,
                chunk_tokens: 450,
                generation: GenerationParams {
                    max_tokens: 200,
                    min_tokens: 80,
                    beam_count: 5,
                    length_penalty: 2.0,
                    repetition_penalty: 2.0,
                    no_repeat_ngram_size: 3,
                },
            },
            large: SummaryTier {
                kind: TierKind::Large,
                chunk_tokens: 480,
                generation: GenerationParams {
                    max_tokens: 256,
                    min_tokens: 100,
                    beam_count: 6,
                    length_penalty: 2.0,
                    repetition_penalty: 2.0,
                    no_repeat_ngram_size: 3,
                },
            },
            early_stop_multiplier: 1.2,
            quality_floor_multiplier: 0.8,
            min_input_chars: 10,
            strategy: ReductionStrategy::Trim,
            max_depth: 4,
        }
    }
}

impl SummarizerConfig {
    /// Defaults overridden by `WIKIBRIEF_*` environment variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        let strategy = get_env_string_or("WIKIBRIEF_STRATEGY", &d.strategy.to_string())
            .parse()
            .unwrap_or_else(|e| {
                tracing::warn!("{}, using {}", e, d.strategy);
                d.strategy
            });

        Self {
            max_input_tokens: get_env_var_or("WIKIBRIEF_MAX_INPUT_TOKENS", d.max_input_tokens),
            instruction_prefix: get_env_string_or("WIKIBRIEF_PREFIX", &d.instruction_prefix)
                .trim_end()
                .to_string()
                + " ",
            small_tier_max_words: get_env_var_or(
                "WIKIBRIEF_SMALL_TIER_MAX_WORDS",
                d.small_tier_max_words,
            ),
            medium_tier_max_words: get_env_var_or(
                "WIKIBRIEF_MEDIUM_TIER_MAX_WORDS",
                d.medium_tier_max_words,
            ),
            small: d.small.with_env_overrides("SMALL"),
            medium: d.medium.with_env_overrides("MEDIUM"),
            large: d.large.with_env_overrides("LARGE"),
            early_stop_multiplier: get_env_var_or(
                "WIKIBRIEF_EARLY_STOP_MULTIPLIER",
                d.early_stop_multiplier,
            ),
            quality_floor_multiplier: get_env_var_or(
                "WIKIBRIEF_QUALITY_FLOOR",
                d.quality_floor_multiplier,
            ),
            min_input_chars: get_env_var_or("WIKIBRIEF_MIN_INPUT_CHARS", d.min_input_chars),
            strategy,
            max_depth: get_env_var_or("WIKIBRIEF_MAX_DEPTH", d.max_depth),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.small_tier_max_words >= self.medium_tier_max_words {
            return Err(ConfigError::TierBounds {
                small: self.small_tier_max_words,
                medium: self.medium_tier_max_words,
            });
        }

        for tier in [&self.small, &self.medium, &self.large] {
            if tier.chunk_tokens + PREFIX_TOKEN_MARGIN > self.max_input_tokens {
                return Err(ConfigError::ChunkTooLarge {
                    tier: tier.kind,
                    chunk_tokens: tier.chunk_tokens,
                    max_input_tokens: self.max_input_tokens,
                });
            }
            if tier.generation.beam_count == 0 {
                return Err(ConfigError::ZeroBeams { tier: tier.kind });
            }
            if tier.generation.min_tokens > tier.generation.max_tokens {
                return Err(ConfigError::LengthBounds {
                    tier: tier.kind,
                    min_tokens: tier.generation.min_tokens,
                    max_tokens: tier.generation.max_tokens,
                });
            }
        }

        if self.quality_floor_multiplier <= 0.0
            || self.quality_floor_multiplier >= self.early_stop_multiplier
        {
            return Err(ConfigError::Multipliers {
                floor: self.quality_floor_multiplier,
                early_stop: self.early_stop_multiplier,
            });
        }

        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }

        Ok(())
    }

    /// Picks the tier for a requested summary length.
    pub fn tier_for(&self, target_words: usize) -> &SummaryTier {
        if target_words <= self.small_tier_max_words {
            &self.small
        } else if target_words <= self.medium_tier_max_words {
            &self.medium
        } else {
            &self.large
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(SummarizerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_tier_boundaries() {
        let config = SummarizerConfig::default();
        assert_eq!(config.tier_for(150).kind, TierKind::Small);
        assert_eq!(config.tier_for(1500).kind, TierKind::Small);
        assert_eq!(config.tier_for(1501).kind, TierKind::Medium);
        assert_eq!(config.tier_for(3000).kind, TierKind::Medium);
        assert_eq!(config.tier_for(3001).kind, TierKind::Large);
    }

    #[test]
    fn test_larger_tiers_use_bigger_budgets() {
        let config = SummarizerConfig::default();
        assert!(config.small.chunk_tokens <= config.medium.chunk_tokens);
        assert!(config.medium.chunk_tokens <= config.large.chunk_tokens);
        assert!(config.small.generation.beam_count < config.large.generation.beam_count);
        assert!(config.small.generation.max_tokens < config.large.generation.max_tokens);
    }

    #[test]
    fn test_chunk_ceiling_must_fit_encoder() {
        let mut config = SummarizerConfig::default();
        config.large.chunk_tokens = 510;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ChunkTooLarge {
                tier: TierKind::Large,
                ..
            })
        ));
    }

    #[test]
    fn test_floor_must_sit_below_early_stop() {
        let mut config = SummarizerConfig::default();
        config.quality_floor_multiplier = 1.3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Multipliers { .. })
        ));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("Recursive".parse::<ReductionStrategy>(), Ok(ReductionStrategy::Recursive));
        assert_eq!(" trim ".parse::<ReductionStrategy>(), Ok(ReductionStrategy::Trim));
        assert!("shorten".parse::<ReductionStrategy>().is_err());
    }
}
