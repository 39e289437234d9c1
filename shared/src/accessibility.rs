//! Accessibility adapter: rewrites responses for citizens who need simpler language.

use std::sync::Arc;

use tracing::info;

use crate::llm::TextGenerator;
use crate::models::{CitizenProfile, LiteracyLevel, ResponseBody, ResponsePayload};

/// Tag that always triggers simplification.
pub const SENIOR_CITIZEN_TAG: &str = "Senior Citizen";

/// Confirmation that must survive a rewrite of a filed complaint.
pub const FILED_CONFIRMATION: &str = "Your complaint is filed. We will help you.";

/// Text rewritten in place of a blank handler response.
pub const EMPTY_RESPONSE_TEXT: &str = "Request processed.";

/// Whether a profile asks for simplified language.
pub fn needs_simplification(profile: &CitizenProfile) -> bool {
    profile.literacy_level == LiteracyLevel::Low || profile.has_tag(SENIOR_CITIZEN_TAG)
}

fn indicates_filed_complaint(body: &ResponseBody, text: &str) -> bool {
    if matches!(body, ResponseBody::ComplaintLogged { .. }) {
        return true;
    }
    let text = text.to_lowercase();
    text.contains("complaint") && text.contains("filed")
}

/// Build the rewrite prompt for `original`.
pub fn simplify_prompt(original: &str, complaint_filed: bool) -> String {
    let mut prompt = String::from(
        "Rewrite this government response to be extremely simple, warm, and easy to understand for an elderly or low-literacy citizen.\n",
    );
    if complaint_filed {
        prompt.push_str(&format!(
            "This response confirms a filed complaint. Confirm it clearly: \"{}\"\n",
            FILED_CONFIRMATION
        ));
    }
    prompt.push_str("Use short sentences. Avoid jargon. Use comforting language. Keep every fact, number and id.\n\n");
    prompt.push_str(&format!("Original: \"{}\"", original));
    prompt
}

/// Adapts handler output to the citizen's comprehension needs.
pub struct AccessibilityAdapter {
    generator: Arc<dyn TextGenerator>,
}

impl AccessibilityAdapter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Produce the final payload. `response_display` is always set; the
    /// handler's own fields are never modified.
    pub async fn adapt(&self, body: ResponseBody, profile: Option<&CitizenProfile>) -> ResponsePayload {
        let original = body.primary_text().to_string();

        let profile = match profile {
            Some(p) if needs_simplification(p) => p,
            _ => {
                return ResponsePayload {
                    body,
                    response_display: original,
                    accessibility_mode: false,
                }
            }
        };

        let source = if original.trim().is_empty() {
            EMPTY_RESPONSE_TEXT
        } else {
            original.as_str()
        };

        info!(citizen_id = %profile.citizen_id, "Simplifying response for accessibility");
        let prompt = simplify_prompt(source, indicates_filed_complaint(&body, source));
        let rewritten = self.generator.generate(&prompt).await;
        let rewritten = rewritten.trim();

        ResponsePayload {
            response_display: if rewritten.is_empty() {
                source.to_string()
            } else {
                rewritten.to_string()
            },
            body,
            accessibility_mode: true,
        }
    }
}
