//! Amazon Bedrock text generation through the Converse API.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::types::{ContentBlock, ConversationRole, InferenceConfiguration, Message};
use aws_sdk_bedrockruntime::Client as BedrockClient;

use super::CompletionBackend;
use crate::{Error, Result};

/// Bedrock Converse client for a single model.
pub struct BedrockBackend {
    client: BedrockClient,
    model_id: String,
    max_tokens: i32,
}

impl BedrockBackend {
    pub fn new(client: BedrockClient, model_id: impl Into<String>, max_tokens: i32) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionBackend for BedrockBackend {
    fn name(&self) -> &'static str {
        "bedrock"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(prompt.to_string()))
            .build()
            .map_err(|e| Error::Generation(format!("Failed to build Bedrock message: {}", e)))?;

        let output = self
            .client
            .converse()
            .model_id(&self.model_id)
            .messages(message)
            .inference_config(InferenceConfiguration::builder().max_tokens(self.max_tokens).build())
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_access_denied_exception() {
                    Error::Config(format!("Bedrock access denied: {}", service_error))
                } else {
                    Error::Generation(format!("Bedrock converse failed: {}", service_error))
                }
            })?;

        output
            .output()
            .and_then(|o| o.as_message().ok())
            .and_then(|m| m.content().iter().find_map(|block| block.as_text().ok()))
            .cloned()
            .ok_or_else(|| Error::Generation("Bedrock response had no text".to_string()))
    }
}
