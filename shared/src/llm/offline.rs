//! Deterministic keyword-matched responder used when no live backend is reachable.

use std::time::Duration;

/// A keyword rule: any keyword found in the prompt selects `response`.
#[derive(Debug)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub response: &'static str,
}

/// Ordered rules; the first match wins.
pub const OFFLINE_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["water"],
        response: "I understand you're facing a water supply issue. Could you please confirm your sector number so I can check the outage schedule?",
    },
    KeywordRule {
        keywords: &["electricity", "light"],
        response: "I've noted the electricity issue. Is this a street light problem or a household power cut?",
    },
    KeywordRule {
        keywords: &["policy", "scheme"],
        response: "I can help you with government schemes. We have information on PM-KISAN, Ayushman Bharat, and local housing schemes. Which one are you interested in?",
    },
    KeywordRule {
        keywords: &["document", "upload"],
        response: "To verify your documents, please upload a clear photo or PDF of your Aadhaar Card or Voter ID in the 'Document Verification' section.",
    },
];

/// Catch-all response when no rule matches.
pub const OFFLINE_DEFAULT_RESPONSE: &str = "I am your CivicNexus Assistant. I can help you file complaints, check policies, or verify documents. How can I assist you today?";

/// Offline substitute for the text generation backend.
#[derive(Debug, Clone)]
pub struct OfflineResponder {
    latency: Duration,
}

impl OfflineResponder {
    /// Create a responder that sleeps `latency` before answering.
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Create a responder without artificial latency.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Pick the canned response for a prompt.
    pub fn select(prompt: &str) -> &'static str {
        let prompt = prompt.to_lowercase();
        OFFLINE_RULES
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| prompt.contains(k)))
            .map(|rule| rule.response)
            .unwrap_or(OFFLINE_DEFAULT_RESPONSE)
    }

    /// Answer a prompt after the configured latency.
    pub async fn respond(&self, prompt: &str) -> String {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Self::select(prompt).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        // "water" precedes "light" in rule order.
        let response = OfflineResponder::select("No WATER and no streetlight");
        assert_eq!(response, OFFLINE_RULES[0].response);
    }

    #[test]
    fn test_case_insensitive_match() {
        assert_eq!(
            OfflineResponder::select("Tell me about the PM-KISAN Scheme"),
            OFFLINE_RULES[2].response
        );
        assert_eq!(
            OfflineResponder::select("Streetlight not working"),
            OFFLINE_RULES[1].response
        );
    }

    #[test]
    fn test_catch_all() {
        assert_eq!(OfflineResponder::select("Hello"), OFFLINE_DEFAULT_RESPONSE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let responder = OfflineResponder::new(Duration::from_millis(1500));
        let start = tokio::time::Instant::now();
        let response = responder.respond("upload my document").await;
        assert_eq!(response, OFFLINE_RULES[3].response);
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }
}
