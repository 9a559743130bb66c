//! HTTP front end: the brief form, the generate endpoint, and static
//! serving of previously generated demos.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Form, State};
use axum::response::{Html, IntoResponse, Json};
use axum::routing::{get, post};
use demo_agents::pipeline::{self, Delegator};
use demo_agents::{DemoRequest, extract, html};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Layout;
use crate::store::{DEMOS_ROUTE, DemoStore, GeneratedDemo};

/// State shared by every request.
pub struct AppState {
    pub delegator: Arc<dyn Delegator>,
    pub store: DemoStore,
    pub layout: Layout,
    /// Backend name reported by `/healthz`.
    pub backend: String,
}

// ── Axum router ────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    let demos = ServeDir::new(state.store.root()).append_index_html_on_directories(true);
    Router::new()
        .route("/", get(index))
        .route("/generate-demo", post(generate_demo))
        .route("/healthz", get(healthz))
        .nest_service(DEMOS_ROUTE, demos)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    Html(page(""))
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "backend": state.backend,
    }))
}

/// Every outcome is a 200 page; failures show up as an error block.
async fn generate_demo(
    State(state): State<Arc<AppState>>,
    Form(request): Form<DemoRequest>,
) -> impl IntoResponse {
    tracing::info!(
        customer = %request.customer_name,
        industry = %request.industry,
        "Demo requested"
    );
    match generate(&state, &request).await {
        Ok(demo) => Html(page(&success_block(&demo))),
        Err(e) => {
            tracing::error!(customer = %request.customer_name, "Demo generation failed: {e:#}");
            Html(page(&error_block(&e.to_string())))
        }
    }
}

async fn generate(state: &AppState, request: &DemoRequest) -> anyhow::Result<GeneratedDemo> {
    let response = pipeline::collect_response(state.delegator.as_ref(), request).await?;
    let output = extract::extract_agent_output(&response)?;
    let demo = state.store.write(state.layout, &output, request).await?;
    Ok(demo)
}

// ── Pages ──────────────────────────────────────────────────────────────

fn success_block(demo: &GeneratedDemo) -> String {
    let link = demo.link();
    let items: String = demo
        .files
        .iter()
        .map(|name| {
            format!(
                "<li><a href=\"{}\">{}</a></li>",
                html::escape(&demo.file_link(name)),
                html::escape(name)
            )
        })
        .collect();
    format!(
        r#"<div class="result ok">
<h2>Demo Ready!</h2>
<p><a href="{link}">{link}</a></p>
<ul class="files">{items}</ul>
</div>"#
    )
}

fn error_block(message: &str) -> String {
    format!(
        r#"<div class="result err">
<h2>Something went wrong</h2>
<p>An error occurred: {}</p>
</div>"#,
        html::escape(message)
    )
}

fn page(result: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Demo Engine</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; color: #1f2328; }}
label {{ display: block; margin-top: 1rem; font-weight: 600; }}
input, textarea {{ width: 100%; padding: 0.5rem; box-sizing: border-box; }}
button {{ margin-top: 1.25rem; padding: 0.6rem 1.2rem; }}
.result {{ margin-top: 2rem; padding: 1rem; border-radius: 6px; }}
.ok {{ background: #dafbe1; }}
.err {{ background: #ffebe9; }}
</style>
</head>
<body>
<h1>Demo Engine</h1>
<form method="post" action="/generate-demo">
<label for="customer_name">Customer name</label>
<input id="customer_name" name="customer_name" required>
<label for="industry">Industry</label>
<input id="industry" name="industry" required>
<label for="use_case">Use case</label>
<textarea id="use_case" name="use_case" rows="3" required></textarea>
<button type="submit">Generate demo</button>
</form>
{result}
</body>
</html>
"#
    )
}
