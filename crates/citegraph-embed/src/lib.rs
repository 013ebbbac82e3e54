//! Text encoder for scientific documents.
//!
//! Wraps a SPECTER-style BERT checkpoint loaded from local files via candle.
//! [`LazyEncoder`] defers the (expensive) load until first use behind a
//! once-only initialization barrier, so concurrent first callers trigger at
//! most one load attempt and a failed load is reported distinctly on every
//! later call. `APP_USE_FAKE_EMBEDDINGS=1` swaps in a deterministic hashed
//! embedder for tests and offline development.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use citegraph_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use device::{device_info, select_device};

pub const EMBEDDING_DIM: usize = 768;
pub const MAX_INPUT_TOKENS: usize = 512;

pub struct EncoderModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl EncoderModel {
    pub fn load() -> Result<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir()?;
        tracing::info!("loading encoder from {}", model_dir.display());

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let vb = load_weights(&model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        tracing::info!("encoder ready");
        Ok(Self { model, tokenizer, device })
    }

    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let (input_ids, attention_mask) =
            tokenize::tokenize_batch(&self.tokenizer, texts, MAX_INPUT_TOKENS, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = pool::cls_l2(&hidden)?;
        let rows = pooled.to_device(&Device::Cpu)?.to_vec2::<f32>()?;
        for row in &rows {
            if row.len() != EMBEDDING_DIM {
                return Err(anyhow!("unexpected embedding dim: got {} expected {}", row.len(), EMBEDDING_DIM));
            }
        }
        Ok(rows)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? });
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&weights_path)?;
    let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

/// Encoder load states: unloaded (cell empty), loading (first caller inside
/// `get_or_init`), ready (`Ok`), failed (`Err`, reported on every later call).
pub struct LazyEncoder {
    state: OnceLock<std::result::Result<EncoderModel, String>>,
}

impl LazyEncoder {
    pub fn new() -> Self {
        Self { state: OnceLock::new() }
    }

    fn model(&self) -> Result<&EncoderModel> {
        match self.state.get_or_init(|| EncoderModel::load().map_err(|e| e.to_string())) {
            Ok(model) => Ok(model),
            Err(e) => Err(anyhow!("encoder unavailable: {}", e)),
        }
    }
}

impl Default for LazyEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for LazyEncoder {
    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }
    fn max_len(&self) -> usize {
        MAX_INPUT_TOKENS
    }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.model()?.embed_batch(texts)
    }
}

/// Hashed bag-of-words stand-in for the real model. Deterministic per input
/// text, L2-normalized, same dimensionality as the real encoder.
struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }
    fn max_len(&self) -> usize {
        MAX_INPUT_TOKENS
    }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Construct the encoder for this process. Callers own the returned value and
/// pass it where it is needed; nothing here is process-global.
pub fn get_default_embedder() -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        tracing::info!("using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(EMBEDDING_DIM)));
    }
    Ok(Box::new(LazyEncoder::new()))
}

fn resolve_model_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() {
            return Ok(p);
        }
    }
    if let Ok(dir) = std::env::var("MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() {
            return Ok(p);
        }
    }
    let root = Path::new("../models/specter2");
    if root.exists() {
        return Ok(root.to_path_buf());
    }
    let legacy = Path::new("models/specter2");
    if legacy.exists() {
        return Ok(legacy.to_path_buf());
    }
    Err(anyhow!("Could not locate encoder model directory (set APP_MODEL_DIR)"))
}
