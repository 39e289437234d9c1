//! Intent router: turns free text into a [`Plan`].

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::decode::{decode_json, Decoded};
use crate::llm::TextGenerator;
use crate::models::{Plan, Tool};

/// Tool used when the generated plan cannot be decoded.
pub const FALLBACK_TOOL: Tool = Tool::Policy;

const PLANNER_PROMPT: &str = r#"You are the Planner Agent for a Civic Governance AI.
Your job is to analyze the user's query and route it to the correct tool.

Available Tools:
1. "complaint": For reporting issues like potholes, water problems, street lights, garbage, etc.
2. "policy": For questions about rules, regulations, application processes, documents needed, gov schemes.
3. "document": For verifying documents or status of applications.

Output strictly valid JSON in this format:
{
  "tool": "tool_name",
  "input": "extracted_core_query"
}

User Query: "{query}""#;

#[derive(Debug, Deserialize)]
struct RawPlan {
    tool: Option<String>,
    input: Option<String>,
}

/// Build the classification prompt for a query.
pub fn planner_prompt(query: &str) -> String {
    PLANNER_PROMPT.replace("{query}", query)
}

/// Decode a generated plan. Missing or blank `input` keeps the original query.
pub fn decode_plan(raw: &str, query: &str) -> Decoded<Plan> {
    decode_json::<RawPlan>(raw).and_then(|plan| {
        let tool = plan
            .tool
            .ok_or_else(|| "plan has no tool".to_string())?
            .parse::<Tool>()?;
        let input = plan
            .input
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| query.to_string());
        Ok(Plan { tool, input })
    })
}

/// The plan used when routing fails: answer informationally with the query unchanged.
pub fn fallback_plan(query: &str) -> Plan {
    Plan {
        tool: FALLBACK_TOOL,
        input: query.to_string(),
    }
}

/// Routes queries to one of the handler tools.
pub struct IntentRouter {
    generator: Arc<dyn TextGenerator>,
}

impl IntentRouter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn route(&self, query: &str) -> Plan {
        let raw = self.generator.generate(&planner_prompt(query)).await;

        let plan = decode_plan(&raw, query).unwrap_or_else(|reason| {
            warn!(reason, "Failed to parse planner response, defaulting to policy");
            fallback_plan(query)
        });

        debug!(tool = %plan.tool, input = %plan.input, "Planner output");
        plan
    }
}
