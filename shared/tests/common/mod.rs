//! Shared fixtures for pipeline tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    CitizenProfile, CivicAssistant, HashingEmbedder, LiteracyLevel, OfflineResponder, PolicyDocument,
    PolicyIndex, ProfileTable, TextGenerator,
};

pub const PLANNER_MARKER: &str = "Planner Agent";
pub const COMPLAINT_MARKER: &str = "Civic Complaint Bot";
pub const ANSWER_MARKER: &str = "policy assistant";
pub const REWRITE_MARKER: &str = "Rewrite this government response";

/// Answers prompts containing a marker with a scripted reply; everything
/// else goes to the offline responder.
pub struct ScriptedGenerator {
    rules: Vec<(&'static str, String)>,
    offline: OfflineResponder,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            offline: OfflineResponder::instant(),
        }
    }

    pub fn on(mut self, marker: &'static str, reply: impl Into<String>) -> Self {
        self.rules.push((marker, reply.into()));
        self
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> String {
        match self.rules.iter().find(|(marker, _)| prompt.contains(marker)) {
            Some((_, reply)) => reply.clone(),
            None => self.offline.respond(prompt).await,
        }
    }
}

pub fn policy(title: &str, description: &str, details: serde_json::Value) -> PolicyDocument {
    PolicyDocument {
        title: title.to_string(),
        description: description.to_string(),
        details: details.as_object().cloned().unwrap_or_default(),
    }
}

pub fn corpus() -> Vec<PolicyDocument> {
    vec![
        policy(
            "PM-KISAN",
            "Income support of 6000 rupees per year to all landholding farmer families",
            serde_json::json!({"amount": "6000 per year", "documents": ["Aadhaar", "Land records"]}),
        ),
        policy(
            "Ayushman Bharat",
            "Health insurance cover of 5 lakh rupees per family per year for hospital treatment",
            serde_json::json!({"cover": "5 lakh"}),
        ),
        policy(
            "PM Awas Yojana",
            "Financial assistance to build pucca houses for urban and rural poor",
            serde_json::json!({}),
        ),
        policy(
            "Atal Pension Yojana",
            "Guaranteed monthly pension scheme for workers in the unorganised sector",
            serde_json::json!({"entry_age": "18-40"}),
        ),
    ]
}

pub fn profiles() -> ProfileTable {
    ProfileTable::new(vec![
        CitizenProfile {
            citizen_id: "CIT-001".to_string(),
            name: Some("Ramesh".to_string()),
            literacy_level: LiteracyLevel::Medium,
            tags: vec!["Senior Citizen".to_string()],
        },
        CitizenProfile {
            citizen_id: "CIT-002".to_string(),
            name: None,
            literacy_level: LiteracyLevel::Low,
            tags: Vec::new(),
        },
        CitizenProfile {
            citizen_id: "CIT-003".to_string(),
            name: None,
            literacy_level: LiteracyLevel::High,
            tags: vec!["Student".to_string()],
        },
    ])
}

pub async fn assistant(generator: Arc<dyn TextGenerator>) -> CivicAssistant {
    let index = PolicyIndex::build(corpus(), Arc::new(HashingEmbedder::default()))
        .await
        .expect("index builds");
    CivicAssistant::new(generator, Arc::new(index), profiles())
}

pub fn is_complaint_id(id: &str) -> bool {
    match id.strip_prefix("CMP-") {
        Some(digits) => {
            digits.len() == 5
                && digits.chars().all(|c| c.is_ascii_digit())
                && (10000..=99999).contains(&digits.parse::<u32>().unwrap_or(0))
        }
        None => false,
    }
}
