//! Stage implementations: model-backed, simulated, and template-based.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Findings, NarrativeDraft, NarrativeWriter, Packager, PipelineError, Researcher, Stage};
use crate::artifact::FileArtifact;
use crate::extract;
use crate::html;
use crate::llm::{LlmClient, LlmRequest};
use crate::tools;

const RESEARCH_SYSTEM: &str = "You are an expert market researcher. You are given raw research \
notes about a customer. Summarize the customer's key business challenges, stated priorities and \
relevant industry trends as a short bulleted list. Output ONLY the list, no preamble.";

const NARRATIVE_SYSTEM: &str = r#"You are a creative storyteller and a technical expert.
Your task is to take research findings and a use case, and do two things:
1. Create a compelling demo script in HTML format that a customer engineer can present.
2. Generate a realistic-looking JSON object with mock data that supports the narrative.

Respond with ONLY a JSON object of this shape, nothing else:
{"narrative": "<html demo script>", "mock_data": { ... }}"#;

/// Research from the simulated search tool alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedResearcher;

#[async_trait]
impl Researcher for SimulatedResearcher {
    async fn research(
        &self,
        customer_name: &str,
        industry: &str,
    ) -> Result<Findings, PipelineError> {
        Ok(Findings {
            customer_name: customer_name.to_string(),
            industry: industry.to_string(),
            summary: tools::web_research(customer_name, industry),
        })
    }
}

/// Research tool output condensed by a model.
pub struct LlmResearcher {
    llm: Arc<dyn LlmClient>,
}

impl LlmResearcher {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Researcher for LlmResearcher {
    async fn research(
        &self,
        customer_name: &str,
        industry: &str,
    ) -> Result<Findings, PipelineError> {
        let notes = tools::web_research(customer_name, industry);
        let prompt = format!(
            "Customer: {customer_name}\nIndustry: {industry}\n\nResearch notes:\n{notes}"
        );
        let summary = self
            .llm
            .complete(LlmRequest::new(RESEARCH_SYSTEM, &prompt))
            .await
            .map_err(|source| PipelineError::Llm {
                stage: Stage::Research,
                source,
            })?;
        tracing::info!(backend = self.llm.name(), chars = summary.len(), "Research complete");

        Ok(Findings {
            customer_name: customer_name.to_string(),
            industry: industry.to_string(),
            summary: summary.trim().to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawDraft {
    narrative: String,
    #[serde(default)]
    mock_data: Value,
}

impl From<RawDraft> for NarrativeDraft {
    fn from(raw: RawDraft) -> Self {
        let mock_data = match raw.mock_data {
            Value::String(text) => text,
            other => other.to_string(),
        };
        Self {
            narrative: raw.narrative,
            mock_data,
        }
    }
}

/// Narrative and mock data written by a model.
pub struct LlmNarrativeWriter {
    llm: Arc<dyn LlmClient>,
}

impl LlmNarrativeWriter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl NarrativeWriter for LlmNarrativeWriter {
    async fn write(
        &self,
        findings: &Findings,
        use_case: &str,
    ) -> Result<NarrativeDraft, PipelineError> {
        let prompt = format!(
            "Customer: {}\nIndustry: {}\nUse case: {use_case}\n\nResearch findings:\n{}",
            findings.customer_name, findings.industry, findings.summary
        );
        let raw = self
            .llm
            .complete(LlmRequest::new(NARRATIVE_SYSTEM, &prompt))
            .await
            .map_err(|source| PipelineError::Llm {
                stage: Stage::Narrative,
                source,
            })?;

        let draft: RawDraft = extract::extract_as(&raw).map_err(|source| {
            tracing::warn!(error = %source, "Narrative output could not be parsed");
            PipelineError::Output {
                stage: Stage::Narrative,
                source,
            }
        })?;
        Ok(draft.into())
    }
}

/// Offline narrative built from the findings by template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrativeWriter;

impl TemplateNarrativeWriter {
    /// Bullet lines of the findings, without the leading marker.
    fn points(findings: &Findings) -> Vec<&str> {
        findings
            .summary
            .lines()
            .filter_map(|line| line.trim().strip_prefix("- "))
            .collect()
    }
}

#[async_trait]
impl NarrativeWriter for TemplateNarrativeWriter {
    async fn write(
        &self,
        findings: &Findings,
        use_case: &str,
    ) -> Result<NarrativeDraft, PipelineError> {
        let points = Self::points(findings);
        let customer = html::escape(&findings.customer_name);
        let industry = html::escape(&findings.industry);
        let use_case_html = html::escape(use_case);

        let items: String = points
            .iter()
            .map(|p| format!("<li>{}</li>", html::escape(p)))
            .collect();
        let narrative = format!(
            "<h3>{customer}: {use_case_html}</h3>\n\
             <p>{customer} operates in the {industry} industry. This demo walks through how an \
             AI agent addresses {use_case_html} using the customer's own data.</p>\n\
             <h4>What we learned</h4>\n<ul>{items}</ul>\n\
             <h4>Demo flow</h4>\n<ol>\
             <li>Ask the agent for the current situation at {customer}.</li>\
             <li>Drill into the findings backed by the mock data.</li>\
             <li>Close with the recommended next step.</li></ol>"
        );

        let analysis_results: Vec<Value> = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let impact = if i == 0 { "high" } else { "medium" };
                json!({ "id": i + 1, "finding": p, "impact": impact })
            })
            .collect();
        let mock_data = json!({
            "customer": findings.customer_name,
            "industry": findings.industry,
            "use_case": use_case,
            "analysis_results": analysis_results,
        });

        Ok(NarrativeDraft {
            narrative,
            mock_data: mock_data.to_string(),
        })
    }
}

/// Packaging through [`tools::package_demo`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BundlePackager;

impl Packager for BundlePackager {
    fn package(
        &self,
        narrative: &str,
        mock_data: &str,
        customer_name: &str,
    ) -> Result<Vec<FileArtifact>, PipelineError> {
        Ok(tools::package_demo(narrative, mock_data, customer_name))
    }
}
