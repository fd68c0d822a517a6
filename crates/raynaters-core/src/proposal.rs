//! Automation proposal generator
//!
//! Turns a visitor's description of a manual business process into a
//! structured proposal: a solution summary, a sample of what the automation
//! would produce, and a short hypothetical efficiency series for charting.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::ai::ModelBackend;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationProposal {
    pub strategy: String,
    pub sample_output: String,
    pub efficiency_series: Vec<EfficiencyPoint>,
}

impl AutomationProposal {
    /// The field that came back empty, if any.
    fn missing_field(&self) -> Option<&'static str> {
        if self.strategy.trim().is_empty() {
            Some("strategy")
        } else if self.sample_output.trim().is_empty() {
            Some("sampleOutput")
        } else if self.efficiency_series.is_empty() {
            Some("efficiencySeries")
        } else {
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("proposal request failed: {0}")]
    Backend(#[source] anyhow::Error),
    #[error("no proposal was generated")]
    EmptyResponse,
    #[error("proposal payload was malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("proposal payload has an empty `{0}`")]
    Incomplete(&'static str),
}

/// Schema the model's reply must follow.
pub fn proposal_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "strategy": {
                "type": "STRING",
                "description": "The technical solution architecture proposed by the agency."
            },
            "sampleOutput": {
                "type": "STRING",
                "description": "A sample output of the automation (email, chat log, or data)."
            },
            "efficiencySeries": {
                "type": "ARRAY",
                "description": "Hypothetical ROI/Efficiency data for a chart.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": { "type": "STRING", "description": "Month name (e.g., Month 1)" },
                        "value": { "type": "NUMBER", "description": "Metric value (e.g. Hours Saved)" }
                    },
                    "required": ["label", "value"]
                }
            }
        },
        "required": ["strategy", "sampleOutput", "efficiencySeries"]
    })
}

pub fn build_proposal_prompt(description: &str) -> String {
    format!(
        "You are a Senior Solutions Architect at a premium AI Automation Agency.\n\
         A potential client has described their manual process or pain point: \"{}\".\n\n\
         Your job is to propose a technical automation solution.\n\n\
         I need three distinct outputs:\n\
         1. A \"Proposed Solution\" summarizing the tools and logic we would build \
         (e.g., \"We will build a Make.com scenario that connects Typeform to Slack...\").\n\
         2. A \"Sample Output\" text. If it's an outreach automation, write the email. \
         If it's a chatbot, write a sample conversation. If it's data entry, show a sample JSON log.\n\
         3. 5 hypothetical data points representing \"Hours Saved\" or \"ROI\" over 5 months for a chart.\n",
        description
    )
}

#[derive(Clone)]
pub struct ProposalGenerator {
    backend: Arc<dyn ModelBackend>,
    model: String,
}

impl ProposalGenerator {
    pub fn new(backend: Arc<dyn ModelBackend>, model: &str) -> Self {
        Self {
            backend,
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One request, no retry. The description is expected to be non-blank;
    /// callers guard that.
    pub async fn generate_proposal(&self, description: &str) -> Result<AutomationProposal, ProposalError> {
        let result = self.request(description).await;
        if let Err(e) = &result {
            error!(model = %self.model, "proposal generation failed: {}", e);
        }
        result
    }

    async fn request(&self, description: &str) -> Result<AutomationProposal, ProposalError> {
        let prompt = build_proposal_prompt(description);
        let text = self
            .backend
            .generate_structured(&self.model, &prompt, &proposal_schema())
            .await
            .map_err(ProposalError::Backend)?;

        if text.trim().is_empty() {
            return Err(ProposalError::EmptyResponse);
        }

        let proposal: AutomationProposal = serde_json::from_str(&text)?;
        if let Some(field) = proposal.missing_field() {
            return Err(ProposalError::Incomplete(field));
        }
        Ok(proposal)
    }
}
