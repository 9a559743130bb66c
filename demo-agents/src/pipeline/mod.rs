//! Research → narrative → packaging pipeline.
//!
//! Each stage is a trait so backends can be swapped independently:
//! - [`Researcher`]: findings about a customer and their industry
//! - [`NarrativeWriter`]: HTML demo script plus supporting mock data
//! - [`Packager`]: the final file bundle
//!
//! [`StagedPipeline`] runs the three in order and answers as a
//! [`Delegator`], the text-in/fragments-out contract the web layer uses.

mod orchestrator;
mod stages;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::FileArtifact;
use crate::extract::ExtractError;
use crate::llm::LlmError;
use crate::request::{DemoRequest, compose_instruction};

pub use orchestrator::{Stage, StagedPipeline};
pub use stages::{
    BundlePackager, LlmNarrativeWriter, LlmResearcher, SimulatedResearcher,
    TemplateNarrativeWriter,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} stage failed: {source}")]
    Llm {
        stage: Stage,
        #[source]
        source: LlmError,
    },
    #[error("{stage} stage returned unusable output: {source}")]
    Output {
        stage: Stage,
        #[source]
        source: ExtractError,
    },
    #[error("failed to encode pipeline output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("delegator failed: {0}")]
    Delegator(String),
}

/// What the research stage learned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Findings {
    pub customer_name: String,
    pub industry: String,
    pub summary: String,
}

/// Narrative stage output. `mock_data` is a JSON document as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeDraft {
    pub narrative: String,
    pub mock_data: String,
}

#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, customer_name: &str, industry: &str)
    -> Result<Findings, PipelineError>;
}

#[async_trait]
pub trait NarrativeWriter: Send + Sync {
    async fn write(&self, findings: &Findings, use_case: &str)
    -> Result<NarrativeDraft, PipelineError>;
}

pub trait Packager: Send + Sync {
    fn package(
        &self,
        narrative: &str,
        mock_data: &str,
        customer_name: &str,
    ) -> Result<Vec<FileArtifact>, PipelineError>;
}

/// One piece of a delegator's response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Response text; all text fragments together form the answer.
    Text(String),
    /// Progress note, not part of the answer.
    Status { stage: Stage, detail: String },
}

/// Anything that can turn a demo instruction into a response.
///
/// The final answer is expected to contain an `AgentOutput` JSON object,
/// optionally fenced.
#[async_trait]
pub trait Delegator: Send + Sync {
    async fn delegate(
        &self,
        request: &DemoRequest,
        instruction: &str,
    ) -> Result<Vec<Fragment>, PipelineError>;
}

/// Compose the instruction, run the delegator once, and join its text.
pub async fn collect_response(
    delegator: &dyn Delegator,
    request: &DemoRequest,
) -> Result<String, PipelineError> {
    let instruction = compose_instruction(request);
    let fragments = delegator.delegate(request, &instruction).await?;

    let mut response = String::new();
    for fragment in &fragments {
        match fragment {
            Fragment::Text(text) => response.push_str(text),
            Fragment::Status { stage, detail } => {
                tracing::debug!(%stage, %detail, "Delegator status");
            }
        }
    }
    Ok(response)
}
