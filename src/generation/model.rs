use super::{TextGenerator, sampling};
use crate::{
    Error, Result,
    config::{LocalConfig, SamplingConfig},
};
use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::mistral::{Config as ModelConfig, Model as CausalLm};
use hf_hub::api::tokio::{Api, ApiRepo};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tokenizers::Tokenizer;
use tracing::info;

/// In-process causal-LM generator.
///
/// Checkpoint files come from the Hugging Face hub (cached on disk by
/// hf-hub); the weights are mmapped once at startup and shared behind a
/// mutex, so a single forward pass runs at a time per model instance.
pub struct CausalLmGenerator {
    model: Mutex<CausalLm>,
    tokenizer: Tokenizer,
    device: Device,
    sampling: SamplingConfig,
}

impl CausalLmGenerator {
    pub async fn load(config: &LocalConfig) -> Result<Self> {
        let api = Api::new()?;
        let repo = api.model(config.model.clone());

        info!("Fetching checkpoint files for {}", config.model);
        let tokenizer_path = repo.get("tokenizer.json").await?;
        let config_path = repo.get("config.json").await?;
        let shards = weight_files(&repo).await?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::inference(format!("tokenizer load error: {e}")))?;

        let model_config: ModelConfig = serde_json::from_slice(&fs::read(&config_path)?)?;

        let device = Device::cuda_if_available(0)?;
        info!("Loading {} weight file(s) on {:?}", shards.len(), device);

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&shards, DType::F32, &device)? };
        let model = CausalLm::new(&model_config, vb)?;

        info!("Model {} ready", config.model);

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            device,
            sampling: config.sampling.clone(),
        })
    }
}

/// Single-file checkpoints first, sharded index otherwise.
async fn weight_files(repo: &ApiRepo) -> Result<Vec<PathBuf>> {
    if let Ok(path) = repo.get("model.safetensors").await {
        return Ok(vec![path]);
    }

    let index_path = repo.get("model.safetensors.index.json").await?;
    let index: serde_json::Value = serde_json::from_slice(&fs::read(&index_path)?)?;
    let weight_map = index["weight_map"]
        .as_object()
        .ok_or_else(|| Error::inference("weight_map missing from safetensors index"))?;

    let mut names: Vec<&str> = weight_map.values().filter_map(|v| v.as_str()).collect();
    names.sort_unstable();
    names.dedup();

    let mut shards = Vec::with_capacity(names.len());
    for name in names {
        shards.push(repo.get(name).await?);
    }
    Ok(shards)
}

impl TextGenerator for CausalLmGenerator {
    fn generate(&self, prompt: &str, max_new_tokens: usize) -> Result<String> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| Error::inference(format!("tokenizer encode error: {e}")))?;
        let mut tokens = encoding.get_ids().to_vec();
        if tokens.is_empty() {
            return Err(Error::inference("prompt tokenized to nothing"));
        }

        let eos = self
            .tokenizer
            .token_to_id("</s>")
            .or_else(|| self.tokenizer.token_to_id("<eos>"))
            .unwrap_or(u32::MAX);

        let mut model = self
            .model
            .lock()
            .map_err(|_| Error::inference("model mutex poisoned"))?;
        model.clear_kv_cache();

        let mut processor = LogitsProcessor::from_sampling(
            sampling::seed(&self.sampling),
            sampling::sampling(&self.sampling),
        );

        let mut pos = 0usize;
        for step in 0..max_new_tokens {
            // After the prompt pass, the KV cache means only the latest
            // token is fed forward.
            let ctx: &[u32] = if step == 0 {
                &tokens
            } else {
                &tokens[tokens.len() - 1..]
            };

            let input = Tensor::new(ctx, &self.device)?.unsqueeze(0)?;
            let logits = model.forward(&input, pos)?;
            let seq_len = logits.dim(1)?;
            let logits = logits.i((0, seq_len - 1))?.to_dtype(DType::F32)?;
            pos += ctx.len();

            let mut scores = logits.to_vec1::<f32>()?;
            sampling::ban_repeated_ngrams(&mut scores, &tokens, self.sampling.no_repeat_ngram);
            let logits = Tensor::new(scores.as_slice(), &self.device)?;

            let next = processor.sample(&logits)?;
            if next == eos {
                break;
            }
            tokens.push(next);
        }

        self.tokenizer
            .decode(&tokens, true)
            .map_err(|e| Error::inference(format!("tokenizer decode error: {e}")))
    }
}
