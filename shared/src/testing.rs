//! Scripted generators for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::TextGenerator;

/// Returns the same text for every prompt.
pub struct FixedGenerator {
    text: String,
}

impl FixedGenerator {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &str) -> String {
        self.text.clone()
    }
}

/// Returns fixed text and remembers every prompt it saw.
pub struct RecordingGenerator {
    text: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> String {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.text.clone()
    }
}
