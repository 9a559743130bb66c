//! End-to-end tests for the generate endpoint and demo serving.
//!
//! Each test starts a real server on 127.0.0.1:0 with a temporary demo root
//! and drives it over HTTP.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use demo_agents::pipeline::{Delegator, Fragment, PipelineError};
use demo_agents::DemoRequest;
use demo_server::config::{Layout, ServerConfig};
use demo_server::server::Server;

const MOCK_RESPONSE: &str = r#"{"narrative":"<h3>Mocked Narrative</h3>","files":[{"name":"mock.json","content":"{}"}]}"#;

/// Replies with a fixed response and remembers the instructions it got.
struct StubDelegator {
    reply: Result<String, String>,
    seen: Mutex<Vec<String>>,
}

impl StubDelegator {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Delegator for StubDelegator {
    async fn delegate(
        &self,
        _request: &DemoRequest,
        instruction: &str,
    ) -> Result<Vec<Fragment>, PipelineError> {
        self.seen.lock().unwrap().push(instruction.to_string());
        match &self.reply {
            Ok(text) => Ok(vec![Fragment::Text(text.clone())]),
            Err(message) => Err(PipelineError::Delegator(message.clone())),
        }
    }
}

fn config(root: &Path, layout: Layout) -> ServerConfig {
    ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        demos_dir: root.to_path_buf(),
        layout,
        ..Default::default()
    }
}

async fn start_with(config: ServerConfig, delegator: Option<Arc<dyn Delegator>>) -> SocketAddr {
    let server = match delegator {
        Some(d) => Server::with_delegator(config, d),
        None => Server::new(config),
    };
    let (addr, _handle) = server.start().await.unwrap();
    addr
}

async fn post_brief(addr: SocketAddr, fields: &[(&str, &str)]) -> (reqwest::StatusCode, String) {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/generate-demo"))
        .form(fields)
        .send()
        .await
        .unwrap();
    let status = resp.status();
    (status, resp.text().await.unwrap())
}

const BRIEF: &[(&str, &str)] = &[
    ("customer_name", "MockCustomer"),
    ("industry", "MockIndustry"),
    ("use_case", "MockUseCase"),
];

/// The single directory a bundle was written to.
fn only_demo_dir(root: &Path) -> std::path::PathBuf {
    let dirs: Vec<_> = std::fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_dir())
        .collect();
    assert_eq!(dirs.len(), 1, "expected one demo dir, found {dirs:?}");
    dirs.into_iter().next().unwrap()
}

#[tokio::test]
async fn stub_response_is_written_and_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = StubDelegator::replying(MOCK_RESPONSE);
    let addr = start_with(config(tmp.path(), Layout::Bundle), Some(stub.clone())).await;

    let (status, body) = post_brief(addr, BRIEF).await;
    assert_eq!(status, 200);
    assert!(body.contains("Demo Ready!"), "{body}");
    assert!(body.contains(">mock.json</a>"));

    let dir = only_demo_dir(tmp.path());
    assert_eq!(std::fs::read_to_string(dir.join("mock.json")).unwrap(), "{}");

    let seen = stub.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("'MockCustomer'"));
    assert!(seen[0].contains("'MockIndustry'"));
    assert!(seen[0].contains("'MockUseCase'"));
}

#[tokio::test]
async fn fenced_response_with_prose_is_accepted() {
    let tmp = tempfile::tempdir().unwrap();
    let reply = format!("Here is your demo:\n```json\n{MOCK_RESPONSE}\n```\nEnjoy!");
    let addr = start_with(
        config(tmp.path(), Layout::Bundle),
        Some(StubDelegator::replying(&reply)),
    )
    .await;

    let (status, body) = post_brief(addr, BRIEF).await;
    assert_eq!(status, 200);
    assert!(body.contains("Demo Ready!"), "{body}");
}

#[tokio::test]
async fn written_files_are_served_back() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = start_with(
        config(tmp.path(), Layout::Bundle),
        Some(StubDelegator::replying(MOCK_RESPONSE)),
    )
    .await;
    post_brief(addr, BRIEF).await;

    let dir = only_demo_dir(tmp.path());
    let id = dir.file_name().unwrap().to_string_lossy().to_string();
    let resp = reqwest::get(format!("http://{addr}/generated_demos/{id}/mock.json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "{}");

    let missing = reqwest::get(format!("http://{addr}/generated_demos/{id}/nope.json"))
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

/// Hrefs in the success block, in page order.
fn result_links(body: &str) -> Vec<String> {
    let (_, block) = body.split_once("class=\"result ok\"").expect("no success block");
    block
        .split("href=\"")
        .skip(1)
        .filter_map(|rest| rest.split_once('"').map(|(href, _)| href.to_string()))
        .collect()
}

#[tokio::test]
async fn bundle_link_opens_listing() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = start_with(
        config(tmp.path(), Layout::Bundle),
        Some(StubDelegator::replying(MOCK_RESPONSE)),
    )
    .await;

    let (_, body) = post_brief(addr, BRIEF).await;
    let links = result_links(&body);
    assert!(links[0].starts_with("/generated_demos/") && links[0].ends_with('/'));

    let resp = reqwest::get(format!("http://{addr}{}", links[0])).await.unwrap();
    assert_eq!(resp.status(), 200);
    let listing = resp.text().await.unwrap();
    assert!(listing.contains("<a href=\"mock.json\">mock.json</a>"));
}

#[tokio::test]
async fn file_links_survive_awkward_names() {
    let tmp = tempfile::tempdir().unwrap();
    let reply = r#"{"files":[{"name":"notes#1.md","content":"one"},{"name":"a b?.txt","content":"two"}]}"#;
    let addr = start_with(
        config(tmp.path(), Layout::Bundle),
        Some(StubDelegator::replying(reply)),
    )
    .await;

    let (_, body) = post_brief(addr, BRIEF).await;
    assert!(body.contains(">notes#1.md</a>"), "{body}");
    let links = result_links(&body);
    assert_eq!(links.len(), 3);

    for (href, expected) in links[1..].iter().zip(["one", "two"]) {
        let resp = reqwest::get(format!("http://{addr}{href}")).await.unwrap();
        assert_eq!(resp.status(), 200, "{href}");
        assert_eq!(resp.text().await.unwrap(), expected);
    }
}

#[tokio::test]
async fn offline_backend_produces_full_bundle() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = start_with(config(tmp.path(), Layout::Bundle), None).await;

    let (status, body) = post_brief(addr, BRIEF).await;
    assert_eq!(status, 200);
    assert!(body.contains("Demo Ready!"), "{body}");

    let bundle = only_demo_dir(tmp.path()).join("my_agent");
    for name in ["agent.py", "__init__.py", ".env", "mock_data.json", "README.md"] {
        assert!(bundle.join(name).is_file(), "missing {name}");
    }
    let mock: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(bundle.join("mock_data.json")).unwrap())
            .unwrap();
    assert_eq!(mock["customer"], "MockCustomer");
    assert!(mock["analysis_results"].is_array());
    assert_eq!(
        std::fs::read_to_string(bundle.join(".env")).unwrap(),
        "GOOGLE_API_KEY=\n"
    );
}

#[tokio::test]
async fn page_layout_links_single_html_file() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = start_with(
        config(tmp.path(), Layout::Page),
        Some(StubDelegator::replying(MOCK_RESPONSE)),
    )
    .await;

    let (status, body) = post_brief(addr, BRIEF).await;
    assert_eq!(status, 200);
    assert!(body.contains("href=\"/generated_demos/demo_"), "{body}");

    let pages: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(pages.len(), 1);
    assert!(pages[0].starts_with("demo_") && pages[0].ends_with(".html"));

    let served = reqwest::get(format!("http://{addr}/generated_demos/{}", pages[0]))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(served.contains("<h3>Mocked Narrative</h3>"));
    assert!(served.contains("MockCustomer"));
}

#[tokio::test]
async fn malformed_response_renders_error() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = start_with(
        config(tmp.path(), Layout::Bundle),
        Some(StubDelegator::replying("Sorry, I could not build that demo.")),
    )
    .await;

    let (status, body) = post_brief(addr, BRIEF).await;
    assert_eq!(status, 200);
    assert!(body.contains("An error occurred:"), "{body}");
    assert!(!body.contains("Demo Ready!"));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn unsafe_artifact_name_renders_error() {
    let tmp = tempfile::tempdir().unwrap();
    let reply = r#"{"files":[{"name":"../outside.txt","content":"x"}]}"#;
    let addr = start_with(
        config(tmp.path(), Layout::Bundle),
        Some(StubDelegator::replying(reply)),
    )
    .await;

    let (status, body) = post_brief(addr, BRIEF).await;
    assert_eq!(status, 200);
    assert!(body.contains("unsafe path"), "{body}");
    assert!(!tmp.path().join("outside.txt").exists());
}

#[tokio::test]
async fn delegator_failure_renders_error() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = start_with(
        config(tmp.path(), Layout::Bundle),
        Some(StubDelegator::failing("upstream <timeout>")),
    )
    .await;

    let (status, body) = post_brief(addr, BRIEF).await;
    assert_eq!(status, 200);
    assert!(body.contains("An error occurred:"), "{body}");
    assert!(body.contains("upstream &lt;timeout&gt;"));
}

#[tokio::test]
async fn missing_fields_become_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = StubDelegator::replying(MOCK_RESPONSE);
    let addr = start_with(config(tmp.path(), Layout::Bundle), Some(stub.clone())).await;

    let (status, body) = post_brief(addr, &[("customer_name", "OnlyName")]).await;
    assert_eq!(status, 200);
    assert!(body.contains("Demo Ready!"), "{body}");
    let seen = stub.seen.lock().unwrap();
    assert!(seen[0].contains("'OnlyName'"));
    assert!(seen[0].contains("in the '' industry"));
}

#[tokio::test]
async fn form_and_health_endpoints() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = start_with(config(tmp.path(), Layout::Bundle), None).await;

    let form = reqwest::get(format!("http://{addr}/"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(form.contains("action=\"/generate-demo\""));

    let health: serde_json::Value = reqwest::get(format!("http://{addr}/healthz"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["backend"], "offline");
}

#[tokio::test]
async fn startup_creates_missing_demo_root() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("nested/demos");
    start_with(config(&root, Layout::Bundle), None).await;
    assert!(root.is_dir());
}
