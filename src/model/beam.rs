//! Beam search over decoder logits.
//!
//! The search is independent of the model: callers supply a closure that
//! returns next-token logits for a decoder prefix. Hypotheses are ranked by
//! `log_prob / len^length_penalty`, and the search stops early once
//! `beam_count` hypotheses have emitted end-of-sequence.

use std::collections::HashSet;

use super::{GenerationError, GenerationParams};

#[derive(Debug, Clone)]
pub struct Hypothesis {
    /// Decoder tokens, starting with the decoder start token.
    pub tokens: Vec<u32>,
    pub log_prob: f64,
}

impl Hypothesis {
    fn generated_len(&self) -> usize {
        self.tokens.len().saturating_sub(1)
    }

    pub fn score(&self, length_penalty: f64) -> f64 {
        self.log_prob / (self.generated_len().max(1) as f64).powf(length_penalty)
    }
}

/// Runs beam search and returns the generated tokens of the best hypothesis,
/// without the start token or a trailing end-of-sequence token.
pub fn beam_search<F>(
    params: &GenerationParams,
    start_token: u32,
    eos_token: u32,
    mut next_logits: F,
) -> Result<Vec<u32>, GenerationError>
where
    F: FnMut(&[u32]) -> Result<Vec<f32>, GenerationError>,
{
    let beams = params.beam_count.max(1);
    let mut live = vec![Hypothesis {
        tokens: vec![start_token],
        log_prob: 0.0,
    }];
    let mut finished: Vec<Hypothesis> = Vec::new();

    for _ in 0..params.max_tokens {
        let mut candidates: Vec<(usize, u32, f64)> = Vec::with_capacity(live.len() * 2 * beams);

        for (index, hypothesis) in live.iter().enumerate() {
            let mut logits = next_logits(&hypothesis.tokens)?;
            let generated = &hypothesis.tokens[1..];

            apply_repetition_penalty(&mut logits, generated, params.repetition_penalty);
            ban_repeated_ngrams(&mut logits, generated, params.no_repeat_ngram_size);
            if generated.len() < params.min_tokens {
                if let Some(logit) = logits.get_mut(eos_token as usize) {
                    *logit = f32::NEG_INFINITY;
                }
            }

            let log_probs = log_softmax(&logits);
            for (token, log_prob) in top_k(&log_probs, 2 * beams) {
                if log_prob.is_finite() {
                    candidates.push((index, token, hypothesis.log_prob + log_prob as f64));
                }
            }
        }

        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));
        candidates.truncate(2 * beams);

        let mut next = Vec::with_capacity(beams);
        for (rank, (index, token, log_prob)) in candidates.into_iter().enumerate() {
            let mut tokens = live[index].tokens.clone();
            tokens.push(token);
            let hypothesis = Hypothesis { tokens, log_prob };

            if token == eos_token {
                // An EOS below the top `beams` candidates would never have
                // survived as a live beam either.
                if rank < beams {
                    finished.push(hypothesis);
                }
            } else {
                next.push(hypothesis);
            }

            if next.len() == beams {
                break;
            }
        }

        let done = finished.len() >= beams;
        live = next;
        if done || live.is_empty() {
            break;
        }
    }

    if finished.len() < beams {
        finished.extend(live);
    }

    let best = finished
        .into_iter()
        .max_by(|a, b| {
            a.score(params.length_penalty)
                .total_cmp(&b.score(params.length_penalty))
        })
        .map(|h| h.tokens)
        .unwrap_or_default();

    let mut generated: Vec<u32> = best.into_iter().skip(1).collect();
    if generated.last() == Some(&eos_token) {
        generated.pop();
    }
    Ok(generated)
}

/// Dampens tokens that already occur in `generated`.
pub fn apply_repetition_penalty(logits: &mut [f32], generated: &[u32], penalty: f32) {
    if penalty == 1.0 {
        return;
    }
    let seen: HashSet<u32> = generated.iter().copied().collect();
    for token in seen {
        if let Some(logit) = logits.get_mut(token as usize) {
            *logit = if *logit < 0.0 {
                *logit * penalty
            } else {
                *logit / penalty
            };
        }
    }
}

/// Forbids any token that would complete an n-gram already present in
/// `generated`.
pub fn ban_repeated_ngrams(logits: &mut [f32], generated: &[u32], n: usize) {
    if n == 0 || generated.len() + 1 < n {
        return;
    }
    let prefix = &generated[generated.len() + 1 - n..];
    for window in generated.windows(n) {
        if &window[..n - 1] == prefix {
            if let Some(logit) = logits.get_mut(window[n - 1] as usize) {
                *logit = f32::NEG_INFINITY;
            }
        }
    }
}

pub fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![f32::NEG_INFINITY; logits.len()];
    }
    let sum: f32 = logits.iter().map(|l| (l - max).exp()).sum();
    let log_sum = max + sum.ln();
    logits.iter().map(|l| l - log_sum).collect()
}

/// The `k` highest-scoring tokens, best first.
fn top_k(log_probs: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut indexed: Vec<(u32, f32)> = log_probs
        .iter()
        .enumerate()
        .map(|(token, &lp)| (token as u32, lp))
        .collect();
    if k == 0 {
        return Vec::new();
    }
    if k < indexed.len() {
        indexed.select_nth_unstable_by(k - 1, |a, b| b.1.total_cmp(&a.1));
        indexed.truncate(k);
    }
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    indexed
}
