use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use std::sync::Mutex;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, error, info, warn};

use super::beam::beam_search;
use super::config::ModelConfig;
use super::{ChunkSummarizer, GenerationError, GenerationParams, TokenCounter};
use crate::TARGET_MODEL;

/// T5 summarization service.
///
/// The forward pass mutates internal model state, so invocations are
/// serialized through a mutex. The tokenizer is shared read-only.
pub struct T5Summarizer {
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    device: Device,
    instruction_prefix: String,
    max_input_tokens: usize,
    decoder_start_token_id: u32,
    eos_token_id: u32,
}

impl T5Summarizer {
    pub fn load(
        config: &ModelConfig,
        instruction_prefix: &str,
        max_input_tokens: usize,
    ) -> Result<Self> {
        info!(target: TARGET_MODEL, "Starting to load T5 model from {}", config.model_path);
        let started = Instant::now();

        let mut t5_config: T5Config =
            serde_json::from_str(&std::fs::read_to_string(&config.config_path)?)?;
        // Beams diverge after the first step, so every step re-runs the
        // decoder over the full prefix instead of keeping one KV cache.
        t5_config.use_cache = false;

        let tensors = match candle_core::safetensors::load_buffer(
            &std::fs::read(&config.model_path)?,
            &config.device,
        ) {
            Ok(t) => t,
            Err(e) => {
                error!(target: TARGET_MODEL, "!!! Failed to load model tensors: {}", e);
                return Err(anyhow::anyhow!("Failed to load model tensors: {}", e));
            }
        };
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &config.device);

        let model = match T5ForConditionalGeneration::load(vb, &t5_config) {
            Ok(m) => m,
            Err(e) => {
                error!(target: TARGET_MODEL, "!!! Failed to load T5 model: {}", e);
                return Err(anyhow::anyhow!("Failed to load T5 model: {}", e));
            }
        };

        let tokenizer = match Tokenizer::from_file(&config.tokenizer_path) {
            Ok(t) => t,
            Err(e) => {
                error!(target: TARGET_MODEL, "!!! Failed to load tokenizer: {}", e);
                return Err(anyhow::anyhow!("Failed to load tokenizer: {}", e));
            }
        };

        let decoder_start_token_id = t5_config
            .decoder_start_token_id
            .unwrap_or(t5_config.pad_token_id) as u32;

        info!(target: TARGET_MODEL, "Loaded T5 model and tokenizer in {:?}", started.elapsed());

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            device: config.device.clone(),
            instruction_prefix: instruction_prefix.to_string(),
            max_input_tokens,
            decoder_start_token_id,
            eos_token_id: t5_config.eos_token_id as u32,
        })
    }

    /// Encodes `prefix + text`, dropping everything past the encoder limit
    /// but keeping the closing EOS token.
    fn encode_input(&self, text: &str) -> Result<Vec<u32>, GenerationError> {
        let prefixed = format!("{}{}", self.instruction_prefix, text);
        let encoding = self
            .tokenizer
            .encode(prefixed, true)
            .map_err(GenerationError::Tokenizer)?;

        let mut ids = encoding.get_ids().to_vec();
        if ids.len() > self.max_input_tokens {
            warn!(target: TARGET_MODEL,
                "Encoder input of {} tokens exceeds limit of {}, dropping the excess",
                ids.len(),
                self.max_input_tokens
            );
            ids.truncate(self.max_input_tokens.saturating_sub(1));
            ids.push(self.eos_token_id);
        }
        Ok(ids)
    }
}

impl TokenCounter for T5Summarizer {
    fn count_tokens(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.len(),
            Err(e) => {
                warn!(target: TARGET_MODEL, "Token count failed, estimating from words: {}", e);
                text.split_whitespace().count()
            }
        }
    }
}

impl ChunkSummarizer for T5Summarizer {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String, GenerationError> {
        let started = Instant::now();
        let input_ids = self.encode_input(text)?;
        let input_len = input_ids.len();

        let mut model = self.model.lock().map_err(|_| GenerationError::Poisoned)?;
        model.clear_kv_cache();

        let input = Tensor::new(input_ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input)?;
        let encoded = Instant::now();

        let device = &self.device;
        let tokens = beam_search(
            params,
            self.decoder_start_token_id,
            self.eos_token_id,
            |prefix| {
                let decoder_input = Tensor::new(prefix, device)?.unsqueeze(0)?;
                let logits = model
                    .decode(&decoder_input, &encoder_output)?
                    .squeeze(0)?
                    .to_dtype(DType::F32)?
                    .to_vec1::<f32>()?;
                Ok(logits)
            },
        )?;
        drop(model);

        let summary = self
            .tokenizer
            .decode(&tokens, true)
            .map_err(GenerationError::Tokenizer)?;

        debug!(target: TARGET_MODEL,
            "Generated {} tokens from {} input tokens: encode {:?}, beam search {:?}, beams {}",
            tokens.len(),
            input_len,
            encoded.duration_since(started),
            encoded.elapsed(),
            params.beam_count
        );

        Ok(summary.trim().to_string())
    }
}
