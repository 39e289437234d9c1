//! Shared data models.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QueryRequest {
    #[validate(length(min = 1, max = 2000))]
    pub query: String,
    #[serde(default)]
    pub citizen_id: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            citizen_id: None,
            language: default_language(),
        }
    }

    pub fn for_citizen(mut self, citizen_id: impl Into<String>) -> Self {
        self.citizen_id = Some(citizen_id.into());
        self
    }
}

/// Handler selected by the intent router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Complaint,
    Policy,
    Document,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Complaint => "complaint",
            Tool::Policy => "policy",
            Tool::Document => "document",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = String;

    /// Accepts the bare tool names and their `_agent` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.strip_suffix("_agent").unwrap_or(&name) {
            "complaint" => Ok(Tool::Complaint),
            "policy" => Ok(Tool::Policy),
            "document" => Ok(Tool::Document),
            _ => Err(format!("unknown tool '{}'", s)),
        }
    }
}

/// Routing decision for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub tool: Tool,
    pub input: String,
}

/// Department responsible for a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Department {
    Water,
    Electricity,
    Road,
    Sanitation,
    Works,
    Police,
    General,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Water => "Water",
            Department::Electricity => "Electricity",
            Department::Road => "Road",
            Department::Sanitation => "Sanitation",
            Department::Works => "Works",
            Department::Police => "Police",
            Department::General => "General",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "water" => Ok(Department::Water),
            "electricity" => Ok(Department::Electricity),
            "road" | "roads" => Ok(Department::Road),
            "sanitation" => Ok(Department::Sanitation),
            "works" | "public works" => Ok(Department::Works),
            "police" => Ok(Department::Police),
            "general" => Ok(Department::General),
            _ => Err(format!("unknown department '{}'", s)),
        }
    }
}

/// Complaint urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
        })
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            _ => Err(format!("unknown urgency '{}'", s)),
        }
    }
}

/// One entry of the policy corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl PolicyDocument {
    /// Text that gets embedded for this document.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// Citizen literacy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LiteracyLevel {
    Low,
    Medium,
    High,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Citizen profile used by the accessibility adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitizenProfile {
    #[serde(alias = "id")]
    pub citizen_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub literacy_level: LiteracyLevel,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CitizenProfile {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Read-only citizen profile lookup keyed by citizen id.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    profiles: HashMap<String, CitizenProfile>,
}

impl ProfileTable {
    pub fn new(profiles: Vec<CitizenProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.citizen_id.clone(), p))
                .collect(),
        }
    }

    pub fn get(&self, citizen_id: &str) -> Option<&CitizenProfile> {
        self.profiles.get(citizen_id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Document verification status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerificationStatus {
    Verified,
    Pending,
    Rejected,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerificationStatus::Verified => "Verified",
            VerificationStatus::Pending => "Pending",
            VerificationStatus::Rejected => "Rejected",
        })
    }
}

/// Handler output, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBody {
    ComplaintLogged {
        complaint_id: String,
        department: Department,
        urgency: Urgency,
        suggested_action: String,
        original_query: String,
    },
    ChatResponse {
        response: String,
    },
    PolicyInfo {
        response: String,
        sources: Vec<String>,
    },
    DocumentStatus {
        response: String,
        status: VerificationStatus,
        verification_id: String,
    },
    Error {
        response: String,
    },
}

impl ResponseBody {
    /// The `response` text, or `suggested_action` for filed complaints.
    pub fn primary_text(&self) -> &str {
        match self {
            ResponseBody::ComplaintLogged { suggested_action, .. } => suggested_action,
            ResponseBody::ChatResponse { response }
            | ResponseBody::PolicyInfo { response, .. }
            | ResponseBody::DocumentStatus { response, .. }
            | ResponseBody::Error { response } => response,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ResponseBody::ComplaintLogged { .. } => "complaint_logged",
            ResponseBody::ChatResponse { .. } => "chat_response",
            ResponseBody::PolicyInfo { .. } => "policy_info",
            ResponseBody::DocumentStatus { .. } => "document_status",
            ResponseBody::Error { .. } => "error",
        }
    }
}

/// Final response returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsePayload {
    #[serde(flatten)]
    pub body: ResponseBody,
    pub response_display: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub accessibility_mode: bool,
}

impl ResponsePayload {
    /// Generic error payload for unexpected pipeline failures.
    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            body: ResponseBody::Error {
                response: format!("Error: {}", message),
            },
            response_display: format!("System Error: {}", message),
            accessibility_mode: false,
        }
    }
}
