//! AWS Secrets Manager lookup for backend credentials.

use aws_sdk_secretsmanager::Client as SecretsClient;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::{Error, Result};

/// Cached secrets with lazy initialization.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// JSON keys accepted for an API key stored as a key/value secret.
const API_KEY_FIELDS: &[&str] = &["api_key", "GEMINI_API_KEY", "apiKey"];

/// Get a secret value from Secrets Manager with caching.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    {
        let cache = get_cache().read().await;
        if let Some(value) = cache.get(secret_arn) {
            return Ok(value.clone());
        }
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    {
        let mut cache = get_cache().write().await;
        cache.insert(secret_arn.to_string(), secret_string.clone());
    }

    Ok(secret_string)
}

/// Fetch a generation API key stored either as plain text or as a key/value secret.
pub async fn resolve_api_key(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    let secret_string = get_secret(client, secret_arn).await?;
    parse_api_key(&secret_string)
}

fn parse_api_key(secret_string: &str) -> Result<String> {
    let trimmed = secret_string.trim();
    if !trimmed.starts_with('{') {
        return non_empty(trimmed);
    }

    let fields: HashMap<String, serde_json::Value> = serde_json::from_str(trimmed)?;
    API_KEY_FIELDS
        .iter()
        .find_map(|name| fields.get(*name).and_then(|v| v.as_str()))
        .ok_or_else(|| Error::Config("Secret has no API key field".to_string()))
        .and_then(non_empty)
}

fn non_empty(key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::Config("API key secret is empty".to_string()));
    }
    Ok(key.to_string())
}
