//! Local ONNX Runtime embedding provider.
//!
//! Implements [`EmbeddingProvider`] using the all-MiniLM-L6-v2 model via `ort`.
//! Large batches are fed to the session in fixed-size chunks behind a progress
//! bar; the caller still sees one call and one aligned result.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{ArrayView3, Axis};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{EmbeddingProvider, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

/// Maximum sequence length for all-MiniLM-L6-v2 (trained at 256).
const MAX_SEQ_LEN: usize = 256;

/// Texts per inference call. Bounds padded-tensor memory on large catalogs.
const INFERENCE_CHUNK: usize = 32;

/// Local ONNX-based embedding provider using all-MiniLM-L6-v2.
pub struct LocalEmbeddingProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Safety: Tokenizer is Send+Sync. Session is behind a Mutex.
// The Mutex guarantees exclusive access during run().
unsafe impl Send for LocalEmbeddingProvider {}
unsafe impl Sync for LocalEmbeddingProvider {}

/// Paths to the model files inside the configured model directory.
pub fn model_files(config: &EmbeddingConfig) -> (PathBuf, PathBuf) {
    let dir = crate::config::expand_tilde(&config.cache_dir);
    (dir.join("model.onnx"), dir.join("tokenizer.json"))
}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model_path, tokenizer_path) = model_files(config);

        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `careermatch model download` first.",
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "Tokenizer not found at {}. Run `careermatch model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .context("failed to load ONNX model")?;

        tracing::info!(model = %config.model, path = %model_path.display(), "ONNX model loaded");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;

        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            strategy: tokenizers::PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Run one padded batch through the model and mean-pool the token states.
    fn infer_chunk(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());

        let mut input_ids = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask = Vec::with_capacity(batch_size * seq_len);
        for encoding in &encodings {
            input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        }
        // Single-segment input: token types are all zero.
        let token_type_ids = vec![0i64; batch_size * seq_len];

        let shape = vec![batch_size as i64, seq_len as i64];
        let outputs_data = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

            let outputs = session.run(ort::inputs! {
                "input_ids" => Tensor::from_array((shape.clone(), input_ids.into_boxed_slice()))?,
                "attention_mask" => Tensor::from_array((shape.clone(), attention_mask.clone().into_boxed_slice()))?,
                "token_type_ids" => Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?,
            })?;

            // Output name varies by ONNX export.
            let hidden = outputs
                .get("token_embeddings")
                .or_else(|| outputs.get("last_hidden_state"))
                .unwrap_or_else(|| &outputs[0]);

            let (dims, data) = hidden
                .try_extract_tensor::<f32>()
                .context("failed to extract token embeddings tensor")?;
            let dims: Vec<i64> = dims.iter().copied().collect();
            anyhow::ensure!(
                dims.len() == 3 && dims[0] == batch_size as i64 && dims[2] == EMBEDDING_DIM as i64,
                "unexpected token embeddings shape {dims:?}, expected [{batch_size}, seq, {EMBEDDING_DIM}]"
            );
            (dims[1] as usize, data.to_vec())
        };

        let (out_seq_len, data) = outputs_data;
        let hidden = ArrayView3::from_shape((batch_size, out_seq_len, EMBEDDING_DIM), data.as_slice())
            .context("token embeddings do not match reported shape")?;

        let pooled = hidden
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(b, tokens)| {
                let mask = &attention_mask[b * seq_len..(b + 1) * seq_len];
                let mut sum = ndarray::Array1::<f32>::zeros(EMBEDDING_DIM);
                let mut count = 0.0f32;
                for (s, token) in tokens.axis_iter(Axis(0)).enumerate() {
                    if mask.get(s).copied().unwrap_or(0) > 0 {
                        sum += &token;
                        count += 1.0;
                    }
                }
                if count > 0.0 {
                    sum /= count;
                }
                l2_normalize(sum.as_slice().unwrap_or(&[]))
            })
            .collect();

        Ok(pooled)
    }
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let progress = if texts.len() > INFERENCE_CHUNK {
            let pb = ProgressBar::new(texts.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  embedding {bar:40.cyan/blue} {pos}/{len} ({eta})")
                    .map_err(|e| anyhow::anyhow!("invalid progress template: {e}"))?
                    .progress_chars("##-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(INFERENCE_CHUNK) {
            vectors.extend(self.infer_chunk(chunk)?);
            progress.inc(chunk.len() as u64);
        }
        progress.finish_and_clear();

        Ok(vectors)
    }
}

/// L2-normalize a vector. Returns a zero vector if the input norm is zero.
fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}
