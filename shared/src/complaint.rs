//! Complaint handler: classifies a query and files complaints.

use std::sync::Arc;

use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::decode::{decode_json, Decoded};
use crate::llm::TextGenerator;
use crate::models::{Department, ResponseBody, Urgency};

/// Acknowledgement used when the generated analysis cannot be decoded.
pub const FALLBACK_RESPONSE_TEXT: &str = "I have noted your issue. We will look into it.";

/// Follow-up question used when a "Needs Info" analysis carries no text.
pub const FOLLOW_UP_QUESTION: &str =
    "Could you describe the civic issue you are facing, and where it is happening?";

/// Inclusive range of the numeric part of a complaint id.
pub const COMPLAINT_ID_RANGE: std::ops::RangeInclusive<u32> = 10000..=99999;

/// Whether the complaint was filed or more detail is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplaintStatus {
    Filed,
    NeedsInfo,
}

/// Structured analysis of a complaint query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintAnalysis {
    pub department: Department,
    pub urgency: Urgency,
    pub response_text: String,
    pub status: ComplaintStatus,
}

impl ComplaintAnalysis {
    /// Used when decoding fails. Files rather than asking again so the
    /// conversation always terminates.
    pub fn fallback() -> Self {
        Self {
            department: Department::General,
            urgency: Urgency::Medium,
            response_text: FALLBACK_RESPONSE_TEXT.to_string(),
            status: ComplaintStatus::Filed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    department: Option<String>,
    urgency: Option<String>,
    response_text: Option<String>,
    status: Option<String>,
}

impl From<RawAnalysis> for ComplaintAnalysis {
    fn from(raw: RawAnalysis) -> Self {
        let status = match raw.status.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("filed") => ComplaintStatus::Filed,
            _ => ComplaintStatus::NeedsInfo,
        };
        let default_text = match status {
            ComplaintStatus::Filed => FALLBACK_RESPONSE_TEXT,
            ComplaintStatus::NeedsInfo => FOLLOW_UP_QUESTION,
        };

        Self {
            department: raw
                .department
                .and_then(|d| d.parse().ok())
                .unwrap_or(Department::General),
            urgency: raw
                .urgency
                .and_then(|u| u.parse().ok())
                .unwrap_or(Urgency::Medium),
            response_text: raw
                .response_text
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| default_text.to_string()),
            status,
        }
    }
}

/// Decode a generated complaint analysis.
pub fn decode_analysis(raw: &str) -> Decoded<ComplaintAnalysis> {
    decode_json::<RawAnalysis>(raw).map(ComplaintAnalysis::from)
}

/// Build the classification and extraction prompt.
pub fn complaint_prompt(query: &str) -> String {
    format!(
        r#"You are an intelligent Civic Complaint Bot.

USER QUERY: "{query}"

TASK:
1. Analyze if this is a complaint about a civic issue (Water, Electricity, Road, Sanitation, etc.).
2. If it IS a complaint (even a short one like "Streetlight not working"):
   - Extract 'department' (Water, Electricity, Road, Sanitation, Works, Police, General).
   - Extract 'urgency' (Low, Medium, High).
   - Generate a 'response_text': A polite, professional confirmation that the complaint is filed. Mention what action will be taken.
   - Set 'status' to "Filed".
3. If it is NOT a complaint (e.g. "Hello", "How are you"):
   - Set 'status' to "Needs Info".
   - Generate 'response_text' asking them to describe their issue.

OUTPUT FORMAT (Strict JSON):
{{
    "department": "...",
    "urgency": "...",
    "response_text": "...",
    "status": "Filed" or "Needs Info"
}}"#
    )
}

/// Generate a complaint id of the form `CMP-NNNNN`.
pub fn generate_complaint_id<R: Rng>(rng: &mut R) -> String {
    format!("CMP-{}", rng.gen_range(COMPLAINT_ID_RANGE))
}

/// Files civic complaints from free text.
pub struct ComplaintHandler {
    generator: Arc<dyn TextGenerator>,
}

impl ComplaintHandler {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Classify the query and return a filed complaint or a follow-up question.
    pub async fn process(&self, query: &str) -> ResponseBody {
        let raw = self.generator.generate(&complaint_prompt(query)).await;

        let analysis = decode_analysis(&raw).unwrap_or_else(|reason| {
            warn!(reason, "Failed to parse complaint analysis, filing with defaults");
            ComplaintAnalysis::fallback()
        });

        match analysis.status {
            ComplaintStatus::Filed => {
                let complaint_id = generate_complaint_id(&mut rand::thread_rng());
                info!(
                    complaint_id = %complaint_id,
                    department = %analysis.department,
                    urgency = %analysis.urgency,
                    "Complaint filed"
                );
                ResponseBody::ComplaintLogged {
                    complaint_id,
                    department: analysis.department,
                    urgency: analysis.urgency,
                    suggested_action: analysis.response_text,
                    original_query: query.to_string(),
                }
            }
            ComplaintStatus::NeedsInfo => ResponseBody::ChatResponse {
                response: analysis.response_text,
            },
        }
    }
}
