use anyhow::Result;
use candle_core::Device;
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::environment::get_env_string_or;
use crate::model::{CONFIG_URL, MODEL_URL, TOKENIZER_URL};
use crate::TARGET_MODEL;

/// Where the T5 weights, model config and tokenizer live on disk.
pub struct ModelConfig {
    pub model_dir: String,
    pub model_path: String,
    pub config_path: String,
    pub tokenizer_path: String,
    pub device: Device,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::in_dir("models")
    }
}

impl ModelConfig {
    pub fn in_dir(model_dir: &str) -> Self {
        let dir = model_dir.trim_end_matches('/');
        Self {
            model_dir: dir.to_string(),
            model_path: format!("{}/t5-base.safetensors", dir),
            config_path: format!("{}/t5-base-config.json", dir),
            tokenizer_path: format!("{}/t5-base-tokenizer.json", dir),
            device: Device::Cpu,
        }
    }

    /// Reads `WIKIBRIEF_MODEL_DIR`, defaulting to `models`.
    pub fn from_env() -> Self {
        Self::in_dir(&get_env_string_or("WIKIBRIEF_MODEL_DIR", "models"))
    }

    pub async fn ensure_models_exist(&self) -> Result<()> {
        if !Path::new(&self.model_dir).exists() {
            fs::create_dir_all(&self.model_dir).await?;
        }

        for (url, path) in [
            (MODEL_URL, &self.model_path),
            (CONFIG_URL, &self.config_path),
            (TOKENIZER_URL, &self.tokenizer_path),
        ] {
            if Path::new(path).exists() {
                continue;
            }
            info!(target: TARGET_MODEL, "Downloading {} to {}", url, path);
            let response = reqwest::get(url).await?.error_for_status()?;
            let bytes = response.bytes().await?;
            fs::write(path, bytes).await?;
            info!(target: TARGET_MODEL, "Downloaded {}", path);
        }

        Ok(())
    }
}
