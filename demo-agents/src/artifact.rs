//! Output types shared by the packager and the demo writer.

use serde::{Deserialize, Serialize};

/// A file to be written into a demo bundle.
///
/// `name` is relative and may contain `/` separators (`my_agent/agent.py`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileArtifact {
    pub name: String,
    pub content: String,
}

impl FileArtifact {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Final output of a pipeline run.
///
/// Older producers emit `{narrative, files}`, newer ones only `{files}`;
/// both deserialize here. A missing `files` key means no files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(default)]
    pub files: Vec<FileArtifact>,
}

impl AgentOutput {
    /// Look up an artifact by its relative name.
    pub fn file(&self, name: &str) -> Option<&FileArtifact> {
        self.files.iter().find(|f| f.name == name)
    }
}
