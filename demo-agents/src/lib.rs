//! demo-agents: turns a customer brief into a packaged demo.
//!
//! A brief (customer, industry, use case) runs through three stages:
//! - Research: findings about the customer and their industry
//! - Narrative: an HTML demo script plus mock data that supports it
//! - Packaging: a small agent project bundle built from the two
//!
//! The stages are traits, so any generative backend (or none) can sit
//! behind them. The server crate only sees a [`pipeline::Delegator`].

pub mod artifact;
pub mod extract;
pub mod gemini;
pub mod html;
pub mod llm;
pub mod pipeline;
pub mod request;
pub mod tools;

pub use artifact::{AgentOutput, FileArtifact};
pub use pipeline::{Delegator, Fragment, PipelineError, StagedPipeline};
pub use request::DemoRequest;
