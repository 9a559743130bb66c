//! Staged pipeline: runs research, narrative and packaging in order.

use std::sync::Arc;

use async_trait::async_trait;

use super::stages::{
    BundlePackager, LlmNarrativeWriter, LlmResearcher, SimulatedResearcher,
    TemplateNarrativeWriter,
};
use super::{Delegator, Fragment, NarrativeWriter, Packager, PipelineError, Researcher};
use crate::artifact::AgentOutput;
use crate::llm::LlmClient;
use crate::request::DemoRequest;

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Research,
    Narrative,
    Packaging,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Research => write!(f, "research"),
            Stage::Narrative => write!(f, "narrative"),
            Stage::Packaging => write!(f, "packaging"),
        }
    }
}

/// The three stages wired together.
#[derive(Clone)]
pub struct StagedPipeline {
    researcher: Arc<dyn Researcher>,
    writer: Arc<dyn NarrativeWriter>,
    packager: Arc<dyn Packager>,
}

impl StagedPipeline {
    pub fn new(
        researcher: Arc<dyn Researcher>,
        writer: Arc<dyn NarrativeWriter>,
        packager: Arc<dyn Packager>,
    ) -> Self {
        Self {
            researcher,
            writer,
            packager,
        }
    }

    /// Deterministic pipeline with no model calls.
    pub fn offline() -> Self {
        Self::new(
            Arc::new(SimulatedResearcher),
            Arc::new(TemplateNarrativeWriter),
            Arc::new(BundlePackager),
        )
    }

    /// Model-backed research and narrative; packaging stays deterministic.
    pub fn with_llm(research_llm: Arc<dyn LlmClient>, task_llm: Arc<dyn LlmClient>) -> Self {
        Self::new(
            Arc::new(LlmResearcher::new(research_llm)),
            Arc::new(LlmNarrativeWriter::new(task_llm)),
            Arc::new(BundlePackager),
        )
    }

    /// Run every stage, reporting progress through `on_status`.
    pub async fn run(
        &self,
        request: &DemoRequest,
        mut on_status: impl FnMut(Stage, String) + Send,
    ) -> Result<AgentOutput, PipelineError> {
        tracing::info!(stage = %Stage::Research, customer = %request.customer_name, "Stage started");
        on_status(Stage::Research, format!("Researching {}", request.customer_name));
        let findings = self
            .researcher
            .research(&request.customer_name, &request.industry)
            .await?;

        tracing::info!(stage = %Stage::Narrative, "Stage started");
        on_status(Stage::Narrative, format!("Writing narrative for {}", request.use_case));
        let draft = self.writer.write(&findings, &request.use_case).await?;

        tracing::info!(stage = %Stage::Packaging, "Stage started");
        let files = self
            .packager
            .package(&draft.narrative, &draft.mock_data, &request.customer_name)?;
        on_status(Stage::Packaging, format!("Packaged {} files", files.len()));

        Ok(AgentOutput {
            narrative: Some(draft.narrative),
            files,
        })
    }
}

#[async_trait]
impl Delegator for StagedPipeline {
    async fn delegate(
        &self,
        request: &DemoRequest,
        instruction: &str,
    ) -> Result<Vec<Fragment>, PipelineError> {
        tracing::debug!(%instruction, "Delegating");
        let mut fragments = Vec::new();
        let output = self
            .run(request, |stage, detail| {
                fragments.push(Fragment::Status { stage, detail })
            })
            .await?;

        let json = serde_json::to_string_pretty(&output)?;
        fragments.push(Fragment::Text(format!("```json\n{json}\n```")));
        Ok(fragments)
    }
}
