//! Demo writer: persists generated demos under a root directory.
//!
//! Each demo gets a fresh UUID, so concurrent requests never share a path.
//! Writes are not atomic: a failure part-way through a bundle leaves the
//! files written so far in place.

use std::path::{Component, Path, PathBuf};

use demo_agents::html;
use demo_agents::{AgentOutput, DemoRequest, FileArtifact};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Layout;

/// URL prefix the demo root is served under.
pub const DEMOS_ROUTE: &str = "/generated_demos";

/// Listing written into every bundle that does not ship its own.
const INDEX_FILE: &str = "index.html";

/// Characters left bare inside one URL path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("refusing to write artifact with unsafe path '{0}'")]
    UnsafePath(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A demo persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDemo {
    pub id: Uuid,
    pub layout: Layout,
    /// Relative names of the files written, in write order.
    pub files: Vec<String>,
}

impl GeneratedDemo {
    /// Browsable link to the demo.
    pub fn link(&self) -> String {
        match self.layout {
            Layout::Bundle => format!("{DEMOS_ROUTE}/{}/", self.id),
            Layout::Page => format!("{DEMOS_ROUTE}/demo_{}.html", self.id),
        }
    }

    /// Link to one written file.
    pub fn file_link(&self, name: &str) -> String {
        match self.layout {
            Layout::Bundle => format!("{DEMOS_ROUTE}/{}/{}", self.id, encode_path(name)),
            Layout::Page => self.link(),
        }
    }
}

/// Writes demos below an explicit root directory.
#[derive(Debug, Clone)]
pub struct DemoStore {
    root: PathBuf,
}

impl DemoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if it does not exist yet.
    pub async fn init(&self) -> Result<(), StoreError> {
        create_dir_all(&self.root).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write with the given layout.
    pub async fn write(
        &self,
        layout: Layout,
        output: &AgentOutput,
        request: &DemoRequest,
    ) -> Result<GeneratedDemo, StoreError> {
        match layout {
            Layout::Bundle => self.write_bundle(&output.files).await,
            Layout::Page => self.write_page(output, request).await,
        }
    }

    /// Write every artifact under `<root>/<id>/`, plus an `index.html`
    /// listing them unless the bundle already has one.
    pub async fn write_bundle(&self, files: &[FileArtifact]) -> Result<GeneratedDemo, StoreError> {
        let id = Uuid::new_v4();
        let demo_dir = self.root.join(id.to_string());
        create_dir_all(&demo_dir).await?;

        let mut written = Vec::with_capacity(files.len());
        for file in files {
            let relative = safe_relative_path(&file.name)?;
            let full = demo_dir.join(relative);
            if let Some(parent) = full.parent() {
                create_dir_all(parent).await?;
            }
            tokio::fs::write(&full, &file.content)
                .await
                .map_err(|source| StoreError::Io {
                    path: full.clone(),
                    source,
                })?;
            tracing::debug!(%id, file = %file.name, bytes = file.content.len(), "Wrote artifact");
            written.push(file.name.clone());
        }

        let has_index = files.iter().any(|f| encode_path(&f.name) == INDEX_FILE);
        if !has_index {
            let index = demo_dir.join(INDEX_FILE);
            tokio::fs::write(&index, render_index(id, &written))
                .await
                .map_err(|source| StoreError::Io {
                    path: index.clone(),
                    source,
                })?;
        }

        tracing::info!(%id, files = written.len(), dir = %demo_dir.display(), "Demo bundle written");
        Ok(GeneratedDemo {
            id,
            layout: Layout::Bundle,
            files: written,
        })
    }

    /// Render the narrative and every artifact into `<root>/demo_<id>.html`.
    pub async fn write_page(
        &self,
        output: &AgentOutput,
        request: &DemoRequest,
    ) -> Result<GeneratedDemo, StoreError> {
        let id = Uuid::new_v4();
        let path = self.root.join(format!("demo_{id}.html"));
        let page = render_page(output, request);
        tokio::fs::write(&path, page)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(%id, path = %path.display(), "Demo page written");
        Ok(GeneratedDemo {
            id,
            layout: Layout::Page,
            files: output.files.iter().map(|f| f.name.clone()).collect(),
        })
    }
}

async fn create_dir_all(path: &Path) -> Result<(), StoreError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Accept only plain relative paths: no root, no prefix, no `..`.
fn safe_relative_path(name: &str) -> Result<&Path, StoreError> {
    let path = Path::new(name);
    let plain = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if name.trim().is_empty() || !plain {
        return Err(StoreError::UnsafePath(name.to_string()));
    }
    Ok(path)
}

/// Percent-encode each segment of a relative path, dropping `.` segments.
fn encode_path(name: &str) -> String {
    name.split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .map(|seg| utf8_percent_encode(seg, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Directory listing for a bundle; links are relative to the bundle root.
fn render_index(id: Uuid, files: &[String]) -> String {
    let items: String = files
        .iter()
        .map(|name| {
            format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                html::escape(&encode_path(name)),
                html::escape(name)
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Demo {id}</title>
</head>
<body>
<h1>Demo {id}</h1>
<ul>
{items}</ul>
</body>
</html>
"#
    )
}

/// Single-page rendering of a demo.
fn render_page(output: &AgentOutput, request: &DemoRequest) -> String {
    let customer = html::escape(&request.customer_name);
    let use_case = html::escape(&request.use_case);
    let generated_at = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC");

    let narrative = output
        .narrative
        .as_deref()
        .unwrap_or("<p>No narrative was produced.</p>");

    let artifacts: String = output
        .files
        .iter()
        .map(|f| {
            format!(
                "<section class=\"artifact\">\n<h4>{}</h4>\n<pre>{}</pre>\n</section>\n",
                html::escape(&f.name),
                html::escape(&f.content)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{customer} demo</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #1f2328; }}
pre {{ background: #f6f8fa; padding: 1rem; overflow-x: auto; border-radius: 6px; }}
.meta {{ color: #656d76; font-size: 0.9rem; }}
</style>
</head>
<body>
<h1>{customer}</h1>
<p class="meta">Use case: {use_case} &middot; generated {generated_at}</p>
<section class="narrative">
{narrative}
</section>
<h2>Artifacts</h2>
{artifacts}</body>
</html>
"#
    )
}
