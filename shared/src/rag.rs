//! Retrieval answering engine: answers policy questions from the corpus.

use std::sync::Arc;

use tracing::debug;

use crate::index::{PolicyIndex, SearchHit};
use crate::llm::TextGenerator;
use crate::models::{PolicyDocument, ResponseBody};
use crate::Result;

/// Documents retrieved per answer.
pub const DEFAULT_TOP_K: usize = 3;

/// Separator between documents in the context block.
pub const CONTEXT_DELIMITER: &str = "\n---\n";

/// Render one document for the context block.
pub fn format_document(document: &PolicyDocument) -> String {
    let details = serde_json::Value::Object(document.details.clone());
    format!(
        "Scheme: {}\nDescription: {}\nDetails: {}",
        document.title, document.description, details
    )
}

/// Join retrieved documents into a delimited context block.
pub fn build_context(hits: &[SearchHit<'_>]) -> String {
    hits.iter()
        .map(|hit| format_document(hit.document))
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

/// Build the grounded answering prompt.
pub fn answer_prompt(context: &str, query: &str) -> String {
    format!(
        r#"You are an expert government policy assistant for the 'CivicNexus' platform.
Your goal is to answer citizen questions ACCURATELY based *only* on the provided context.

CONTEXT DATA:
{context}

CITIZEN QUERY: "{query}"

INSTRUCTIONS:
- Include specific details (amounts, eligibility, documents) from the context.
- If the user asks about a scheme present in the context, explain it clearly.
- If the context does not contain the answer, politely say you don't have that info. Do not make anything up.
- Tone: Helpful, Professional, and Empathetic.
- Do not mention "context" or "JSON" in your output. Just answer naturally."#
    )
}

/// Grounds answers in the policy index.
pub struct RetrievalEngine {
    index: Arc<PolicyIndex>,
    generator: Arc<dyn TextGenerator>,
    top_k: usize,
}

impl RetrievalEngine {
    pub fn new(index: Arc<PolicyIndex>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            index,
            generator,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Retrieve, prompt and answer. Sources keep retrieval order.
    pub async fn answer(&self, query: &str) -> Result<ResponseBody> {
        let hits = self.index.search(query, self.top_k).await?;
        let sources: Vec<String> = hits.iter().map(|h| h.document.title.clone()).collect();
        debug!(?sources, "Retrieved policies");

        let prompt = answer_prompt(&build_context(&hits), query);
        let response = self.generator.generate(&prompt).await;

        Ok(ResponseBody::PolicyInfo { response, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::testing::RecordingGenerator;

    fn doc(title: &str, description: &str, details: serde_json::Value) -> PolicyDocument {
        PolicyDocument {
            title: title.to_string(),
            description: description.to_string(),
            details: details.as_object().cloned().unwrap_or_default(),
        }
    }

    async fn index(docs: Vec<PolicyDocument>) -> Arc<PolicyIndex> {
        Arc::new(
            PolicyIndex::build(docs, Arc::new(HashingEmbedder::default()))
                .await
                .unwrap(),
        )
    }

    #[test]
    fn test_format_document_serializes_details() {
        let text = format_document(&doc(
            "PM-KISAN",
            "Income support",
            serde_json::json!({"amount": "6000"}),
        ));
        assert_eq!(
            text,
            "Scheme: PM-KISAN\nDescription: Income support\nDetails: {\"amount\":\"6000\"}"
        );
    }

    #[tokio::test]
    async fn test_answer_cites_sources_in_order() {
        let index = index(vec![
            doc("PM-KISAN", "Income support for farmer families", serde_json::json!({})),
            doc("Ayushman Bharat", "Health insurance for poor families", serde_json::json!({})),
        ])
        .await;
        let generator = Arc::new(RecordingGenerator::new("PM-KISAN gives 6000 rupees a year."));
        let engine = RetrievalEngine::new(index.clone(), generator.clone());

        let body = engine.answer("Tell me about PM-KISAN").await.unwrap();
        let expected: Vec<String> = index
            .search("Tell me about PM-KISAN", DEFAULT_TOP_K)
            .await
            .unwrap()
            .iter()
            .map(|h| h.document.title.clone())
            .collect();

        match body {
            ResponseBody::PolicyInfo { response, sources } => {
                assert_eq!(response, "PM-KISAN gives 6000 rupees a year.");
                assert_eq!(sources, expected);
                assert_eq!(sources[0], "PM-KISAN");
            }
            other => panic!("expected policy_info, got {:?}", other),
        }

        let prompt = generator.last_prompt().unwrap();
        assert!(prompt.contains("Scheme: PM-KISAN"));
        assert!(prompt.contains(CONTEXT_DELIMITER));
        assert!(prompt.contains("CITIZEN QUERY: \"Tell me about PM-KISAN\""));
    }

    #[tokio::test]
    async fn test_empty_corpus_answers_without_sources() {
        let generator = Arc::new(RecordingGenerator::new("I don't have that information."));
        let engine = RetrievalEngine::new(index(Vec::new()).await, generator.clone());

        let body = engine.answer("What is the pension age?").await.unwrap();
        assert_eq!(
            body,
            ResponseBody::PolicyInfo {
                response: "I don't have that information.".to_string(),
                sources: Vec::new(),
            }
        );
        assert!(generator.last_prompt().unwrap().contains("CONTEXT DATA:\n\n"));
    }

    #[tokio::test]
    async fn test_duplicate_titles_are_preserved() {
        let index = index(vec![
            doc("Ration Card", "Apply for a new ration card", serde_json::json!({})),
            doc("Ration Card", "Apply for a new ration card", serde_json::json!({})),
        ])
        .await;
        let engine = RetrievalEngine::new(index, Arc::new(RecordingGenerator::new("ok")));

        match engine.answer("ration card").await.unwrap() {
            ResponseBody::PolicyInfo { sources, .. } => {
                assert_eq!(sources, vec!["Ration Card", "Ration Card"]);
            }
            other => panic!("expected policy_info, got {:?}", other),
        }
    }
}
