//! Sentence embeddings for the policy index.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{Error, Result};

/// Default vector width of the local embedders.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Sentence model used when none is configured.
pub const DEFAULT_SENTENCE_MODEL: &str = "all-MiniLM-L6-v2";

/// Encodes text into a fixed-width dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Resolve a sentence model name to the fastembed model and its output width.
pub fn sentence_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    let name = name.trim().to_ascii_lowercase();
    match name.strip_prefix("sentence-transformers/").unwrap_or(&name) {
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "all-minilm-l12-v2" => Ok((EmbeddingModel::AllMiniLML12V2, 384)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        _ => Err(Error::Config(format!("Unsupported sentence model '{}'", name))),
    }
}

/// Local transformer sentence embeddings through fastembed (ONNX runtime).
///
/// The model is downloaded into `cache_dir` and loaded on first use. A failed
/// load is reported as an embedding error and retried on the next call.
pub struct SentenceEmbedder {
    model: EmbeddingModel,
    dimension: usize,
    cache_dir: PathBuf,
    encoder: OnceCell<Arc<TextEmbedding>>,
}

impl SentenceEmbedder {
    pub fn new(name: &str, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let (model, dimension) = sentence_model(name)?;
        Ok(Self {
            model,
            dimension,
            cache_dir: cache_dir.into(),
            encoder: OnceCell::new(),
        })
    }

    async fn encoder(&self) -> Result<Arc<TextEmbedding>> {
        self.encoder
            .get_or_try_init(|| async {
                let options = InitOptions::new(self.model.clone())
                    .with_cache_dir(self.cache_dir.clone())
                    .with_show_download_progress(false);

                let encoder = tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
                    .await
                    .map_err(|e| Error::Internal(format!("Sentence model loader stopped: {}", e)))?
                    .map_err(|e| Error::Embedding(format!("Failed to load sentence model: {}", e)))?;

                info!(model = ?self.model, dimension = self.dimension, "Loaded sentence model");
                Ok(Arc::new(encoder))
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl Embedder for SentenceEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoder = self.encoder().await?;
        let text = text.to_string();

        let mut vectors = tokio::task::spawn_blocking(move || encoder.embed(vec![text], None))
            .await
            .map_err(|e| Error::Internal(format!("Sentence embedding task stopped: {}", e)))?
            .map_err(|e| Error::Embedding(format!("Sentence embedding failed: {}", e)))?;

        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("Sentence model returned no vector".to_string()))
    }
}

/// Deterministic lexical embedder based on feature hashing.
///
/// Used when no sentence model can be loaded, and in tests. Each lowercase non-stopword token and each character trigram of `#token#` is
/// hashed (FNV-1a) into a signed bucket. The result is L2-normalized, so the
/// squared distance between two texts is `2 - 2 * cosine`. Equal input always
/// produces an equal vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Synchronous encoding; `embed` never fails for this embedder.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            self.add_feature(&mut vector, token.as_bytes(), 1.0);

            let padded: Vec<char> = format!("#{}#", token).chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut vector, gram.as_bytes(), 0.5);
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let bucket = (hash % self.dimension as u64) as usize;
        // Top bit picks the sign so collisions tend to cancel.
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.encode(text))
    }
}

/// Words too common to carry meaning for retrieval.
const STOPWORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "can", "do", "for", "how", "i", "in", "is", "it", "me",
    "my", "of", "on", "or", "tell", "the", "to", "what", "with",
];

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

/// Output widths accepted by Titan Text Embeddings v2.
const TITAN_V2_DIMENSIONS: [usize; 3] = [256, 512, 1024];

/// Titan v2 output width when none is requested.
const TITAN_V2_DEFAULT_DIMENSIONS: usize = 1024;

/// Fixed output width of Titan Text Embeddings v1.
const TITAN_V1_DIMENSIONS: usize = 1536;

/// Output width of a Titan model and whether the request may set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TitanProfile {
    dimension: usize,
    configurable: bool,
}

fn titan_profile(model_id: &str, requested: usize) -> TitanProfile {
    if model_id.contains("titan-embed-text-v2") {
        let dimension = if TITAN_V2_DIMENSIONS.contains(&requested) {
            requested
        } else {
            TITAN_V2_DEFAULT_DIMENSIONS
        };
        TitanProfile {
            dimension,
            configurable: true,
        }
    } else if model_id.contains("titan-embed-text-v1") || model_id.contains("titan-embed-g1-text") {
        TitanProfile {
            dimension: TITAN_V1_DIMENSIONS,
            configurable: false,
        }
    } else {
        TitanProfile {
            dimension: requested,
            configurable: false,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TitanEmbeddingRequest<'a> {
    input_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    normalize: Option<bool>,
}

impl<'a> TitanEmbeddingRequest<'a> {
    fn new(input_text: &'a str, profile: TitanProfile) -> Self {
        Self {
            input_text,
            dimensions: profile.configurable.then_some(profile.dimension),
            normalize: profile.configurable.then_some(true),
        }
    }
}

#[derive(Deserialize)]
struct TitanEmbeddingResponse {
    embedding: Vec<f32>,
}

/// Amazon Titan text embeddings through Bedrock `InvokeModel`.
pub struct BedrockEmbedder {
    client: BedrockClient,
    model_id: String,
    profile: TitanProfile,
}

impl BedrockEmbedder {
    /// `dimension` is honored where the model accepts it; otherwise the
    /// model's own width is used.
    pub fn new(client: BedrockClient, model_id: impl Into<String>, dimension: usize) -> Self {
        let model_id = model_id.into();
        let profile = titan_profile(&model_id, dimension);
        if profile.dimension != dimension {
            warn!(
                model_id = %model_id,
                requested = dimension,
                dimension = profile.dimension,
                "Embedding width not supported by model, using the model's width"
            );
        }
        Self {
            client,
            model_id,
            profile,
        }
    }
}

#[async_trait]
impl Embedder for BedrockEmbedder {
    fn dimension(&self) -> usize {
        self.profile.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::to_vec(&TitanEmbeddingRequest::new(text, self.profile))?;

        let output = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Bedrock embedding failed: {}", e)))?;

        let parsed: TitanEmbeddingResponse = serde_json::from_slice(output.body().as_ref())?;
        if parsed.embedding.len() != self.profile.dimension {
            return Err(Error::Embedding(format!(
                "Embedding dim mismatch: expected {}, got {}",
                self.profile.dimension,
                parsed.embedding.len()
            )));
        }
        Ok(parsed.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let embedder = HashingEmbedder::default();
        let a = embedder.encode("Tell me about PM-KISAN scheme");
        let b = embedder.encode("Tell me about PM-KISAN scheme");
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn test_vectors_are_normalized() {
        let v = HashingEmbedder::default().encode("Ayushman Bharat health cover");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = HashingEmbedder::new(16).encode("  -- the --  ");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_related_text_is_closer() {
        let embedder = HashingEmbedder::default();
        let query = embedder.encode("PM-KISAN farmer income");
        let related = embedder.encode("PM-KISAN income support for farmers");
        let unrelated = embedder.encode("Streetlight repair schedule");
        assert!(squared_distance(&query, &related) < squared_distance(&query, &unrelated));
    }

    #[test]
    fn test_titan_v2_request_shape() {
        let profile = titan_profile("amazon.titan-embed-text-v2:0", 512);
        let body = serde_json::to_value(TitanEmbeddingRequest::new("hello", profile)).unwrap();
        assert_eq!(body["inputText"], "hello");
        assert_eq!(body["dimensions"], 512);
        assert_eq!(body["normalize"], true);
    }

    #[test]
    fn test_titan_v2_unsupported_width_uses_model_default() {
        let profile = titan_profile("amazon.titan-embed-text-v2:0", DEFAULT_DIMENSIONS);
        assert_eq!(profile.dimension, 1024);
        let body = serde_json::to_value(TitanEmbeddingRequest::new("hello", profile)).unwrap();
        assert_eq!(body["dimensions"], 1024);
    }

    #[test]
    fn test_titan_v1_sends_only_input_text() {
        let profile = titan_profile("amazon.titan-embed-text-v1", DEFAULT_DIMENSIONS);
        assert_eq!(profile.dimension, 1536);
        let body = serde_json::to_value(TitanEmbeddingRequest::new("hello", profile)).unwrap();
        assert_eq!(body, serde_json::json!({"inputText": "hello"}));
    }

    #[test]
    fn test_sentence_model_names() {
        let (model, dimension) = sentence_model("sentence-transformers/all-MiniLM-L6-v2").unwrap();
        assert!(matches!(model, EmbeddingModel::AllMiniLML6V2));
        assert_eq!(dimension, 384);
        assert_eq!(sentence_model("bge-base-en-v1.5").unwrap().1, 768);
        assert!(matches!(sentence_model("word2vec"), Err(Error::Config(_))));
    }

    #[test]
    fn test_sentence_embedder_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = SentenceEmbedder::new(DEFAULT_SENTENCE_MODEL, dir.path()).unwrap();
        assert_eq!(embedder.dimension(), 384);
        assert!(embedder.encoder.get().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    #[ignore = "downloads the all-MiniLM-L6-v2 model"]
    async fn test_sentence_embeddings_match_meaning() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = SentenceEmbedder::new(DEFAULT_SENTENCE_MODEL, dir.path()).unwrap();

        let query = embedder.embed("cash help for agriculturists").await.unwrap();
        let farmers = embedder
            .embed("PM-KISAN Income support of 6000 rupees per year to farmer families")
            .await
            .unwrap();
        let pension = embedder
            .embed("Atal Pension Yojana Pension scheme for workers in the unorganised sector")
            .await
            .unwrap();
        assert_eq!(query.len(), 384);
        assert!(squared_distance(&query, &farmers) < squared_distance(&query, &pension));
    }
}
