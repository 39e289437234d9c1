//! Configuration management for the query pipeline.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::embedding::{DEFAULT_DIMENSIONS, DEFAULT_SENTENCE_MODEL};
use crate::{Error, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Policy corpus file
    pub policies_path: PathBuf,
    /// Citizen profile table file
    pub citizen_profiles_path: PathBuf,
    /// Gemini API key (enables Live generation)
    pub gemini_api_key: Option<String>,
    /// ARN of the secret holding the Gemini API key
    pub gemini_api_key_secret_arn: Option<String>,
    /// Gemini model name
    pub gemini_model: String,
    /// Bedrock text model id (enables Live generation when no Gemini key is set)
    pub bedrock_model_id: Option<String>,
    /// Bedrock embedding model id (takes precedence over the local sentence model)
    pub bedrock_embedding_model_id: Option<String>,
    /// Local sentence model name (`none` disables it)
    pub sentence_model: Option<String>,
    /// Download cache for the local sentence model
    pub embedding_cache_dir: PathBuf,
    /// Width for Titan v2 and the hashing embedder
    pub embedding_dimensions: usize,
    /// AWS region
    pub aws_region: String,
    /// Max tokens per live generation call
    pub max_tokens: i32,
    /// Artificial latency of the offline responder
    pub offline_latency: Duration,
    /// Number of documents retrieved per answer
    pub retrieval_top_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policies_path: PathBuf::from("data/policies.json"),
            citizen_profiles_path: PathBuf::from("data/citizen_profiles.json"),
            gemini_api_key: None,
            gemini_api_key_secret_arn: None,
            gemini_model: "gemini-1.5-flash".to_string(),
            bedrock_model_id: None,
            bedrock_embedding_model_id: None,
            sentence_model: Some(DEFAULT_SENTENCE_MODEL.to_string()),
            embedding_cache_dir: PathBuf::from(".fastembed_cache"),
            embedding_dimensions: DEFAULT_DIMENSIONS,
            aws_region: "us-east-1".to_string(),
            max_tokens: 500,
            offline_latency: Duration::from_millis(1500),
            retrieval_top_k: 3,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        // Blank values count as unset.
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            policies_path: get("POLICIES_PATH").map(PathBuf::from).unwrap_or(defaults.policies_path),
            citizen_profiles_path: get("CITIZEN_PROFILES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.citizen_profiles_path),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_api_key_secret_arn: get("GEMINI_API_KEY_SECRET_ARN"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            bedrock_model_id: get("BEDROCK_MODEL_ID"),
            bedrock_embedding_model_id: get("BEDROCK_EMBEDDING_MODEL_ID"),
            sentence_model: match get("LOCAL_EMBEDDING_MODEL") {
                Some(name) if name.eq_ignore_ascii_case("none") => None,
                Some(name) => Some(name),
                None => defaults.sentence_model,
            },
            embedding_cache_dir: get("EMBEDDING_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.embedding_cache_dir),
            embedding_dimensions: parse_or(&get, "EMBEDDING_DIMENSIONS", defaults.embedding_dimensions)?,
            aws_region: get("AWS_REGION").unwrap_or(defaults.aws_region),
            max_tokens: parse_or(&get, "GENERATION_MAX_TOKENS", defaults.max_tokens)?,
            offline_latency: parse_or(&get, "OFFLINE_LATENCY_MS", 1500u64).map(Duration::from_millis)?,
            retrieval_top_k: parse_or(&get, "RETRIEVAL_TOP_K", defaults.retrieval_top_k)?,
        })
    }

    /// Whether any live generation credential is configured.
    pub fn has_live_backend(&self) -> bool {
        self.gemini_api_key.is_some() || self.bedrock_model_id.is_some()
    }

    /// Load the AWS SDK configuration for the configured region.
    pub async fn aws_sdk_config(&self) -> aws_config::SdkConfig {
        aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.aws_region.clone()))
            .load()
            .await
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("{} has invalid value '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.policies_path, PathBuf::from("data/policies.json"));
        assert_eq!(config.retrieval_top_k, 3);
        assert_eq!(config.offline_latency, Duration::from_millis(1500));
        assert_eq!(config.sentence_model.as_deref(), Some("all-MiniLM-L6-v2"));
        assert!(!config.has_live_backend());
    }

    #[test]
    fn test_sentence_model_can_be_disabled() {
        let config = Config::from_lookup(lookup(&[
            ("LOCAL_EMBEDDING_MODEL", "None"),
            ("EMBEDDING_CACHE_DIR", "/tmp/models"),
        ]))
        .unwrap();
        assert!(config.sentence_model.is_none());
        assert_eq!(config.embedding_cache_dir, PathBuf::from("/tmp/models"));
    }

    #[test]
    fn test_blank_credentials_stay_offline() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "   ")])).unwrap();
        assert!(config.gemini_api_key.is_none());
        assert!(!config.has_live_backend());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BEDROCK_MODEL_ID", "anthropic.claude-3-haiku-20240307-v1:0"),
            ("OFFLINE_LATENCY_MS", "0"),
            ("RETRIEVAL_TOP_K", "5"),
        ]))
        .unwrap();
        assert!(config.has_live_backend());
        assert_eq!(config.offline_latency, Duration::ZERO);
        assert_eq!(config.retrieval_top_k, 5);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = Config::from_lookup(lookup(&[("RETRIEVAL_TOP_K", "three")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
