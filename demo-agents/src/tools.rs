//! Tools the stages call with fixed signatures.
//!
//! `web_research` stands in for a search API and returns simulated findings.
//! `package_demo` turns a narrative and mock data into the agent project
//! bundle. Both are pure: nothing here touches the filesystem.

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::artifact::FileArtifact;

/// Directory every packaged file lives under.
pub const BUNDLE_DIR: &str = "my_agent";
/// Model the generated agent is configured with.
pub const GENERATED_AGENT_MODEL: &str = "gemini-2.0-flash-exp";

/// Simulated market research for a customer and their industry.
pub fn web_research(customer_name: &str, industry: &str) -> String {
    tracing::info!(customer = %customer_name, industry = %industry, "Executing web_research");
    format!(
        "Research Summary for {customer_name} ({industry}):\n\
         - Key Industry Challenge: Reducing operational overhead in supply chain logistics.\n\
         - {customer_name}'s Stated Priority: A recent press release highlights a new corporate \
         initiative focused on 'digitizing the customer journey'.\n\
         - Market Trend: There is a growing demand in the {industry} sector for AI-driven \
         predictive analytics to forecast inventory needs."
    )
}

/// Build the demo agent bundle.
///
/// Files come back in a fixed order: `agent.py`, `__init__.py`, `.env`,
/// `mock_data.json`, `README.md`, all under [`BUNDLE_DIR`]. Mock data that
/// parses as JSON is re-indented; anything else is kept verbatim.
pub fn package_demo(
    narrative_context: &str,
    mock_data_json: &str,
    customer_name: &str,
) -> Vec<FileArtifact> {
    tracing::info!(customer = %customer_name, "Executing package_demo");

    let mock_data = match format_mock_data(mock_data_json) {
        Ok(pretty) => pretty,
        Err(e) => {
            tracing::warn!(error = %e, "Mock data is not valid JSON, keeping it verbatim");
            mock_data_json.to_string()
        }
    };

    vec![
        FileArtifact::new(
            format!("{BUNDLE_DIR}/agent.py"),
            agent_source(narrative_context, customer_name),
        ),
        FileArtifact::new(format!("{BUNDLE_DIR}/__init__.py"), ""),
        FileArtifact::new(format!("{BUNDLE_DIR}/.env"), "GOOGLE_API_KEY=\n"),
        FileArtifact::new(format!("{BUNDLE_DIR}/mock_data.json"), mock_data),
        FileArtifact::new(format!("{BUNDLE_DIR}/README.md"), readme(customer_name)),
    ]
}

/// Re-serialize JSON with a four-space indent.
pub fn format_mock_data(raw: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Make the narrative safe inside a Python triple-quoted string.
fn python_literal(text: &str) -> String {
    text.replace("\"\"\"", "'''").replace('"', "\\\"")
}

fn agent_source(narrative_context: &str, customer_name: &str) -> String {
    let safe_narrative = python_literal(narrative_context);
    format!(
        r#"
import json
import os
from google.adk.agents import LlmAgent
from google.adk.tools import tool

# Load Mock Data
# We expect mock_data.json to be in the same directory
current_dir = os.path.dirname(os.path.abspath(__file__))
mock_data_path = os.path.join(current_dir, 'mock_data.json')

try:
    with open(mock_data_path, 'r') as f:
        MOCK_DATA = json.load(f)
except FileNotFoundError:
    print(f"Warning: {{mock_data_path}} not found. Using empty data.")
    MOCK_DATA = {{}}

@tool
def get_customer_data() -> str:
    """Returns the mock data for the customer."""
    return json.dumps(MOCK_DATA)

@tool
def get_demo_context() -> str:
    """Returns the narrative context for the demo."""
    return """{safe_narrative}"""

# Define the Agent
agent = LlmAgent(
    name="DemoAgent",
    model="{GENERATED_AGENT_MODEL}",
    instruction="""You are a demo agent for {customer_name}.
    You have access to specific customer data and narrative context via your tools.
    ALWAYS use `get_demo_context` first to understand the scenario.
    Then use `get_customer_data` to answer specific questions about the customer's challenges and solutions.
    """,
    tools=[get_customer_data, get_demo_context]
)
"#
    )
}

fn readme(customer_name: &str) -> String {
    format!(
        r#"# {customer_name} Demo Agent

This is a generated ADK agent for the {customer_name} demo.

## Prerequisites

- Python 3.10+
- `google-adk` package installed
- `GOOGLE_API_KEY` set in your environment

## Setup

1.  Install dependencies:
    ```bash
    pip install google-adk
    ```

2.  Set your API key:
    ```bash
    export GOOGLE_API_KEY=your_api_key_here
    ```

## Running the Agent

You can run this agent using the ADK CLI or by running the python file directly if you add a runner block.

### Using ADK CLI (Recommended)

Navigate to the parent directory of `{BUNDLE_DIR}` and run:

```bash
adk run {BUNDLE_DIR}.agent:agent
```

### Exploring the Demo

The agent defines the following tools:
- `get_customer_data()`: Returns the simulated data for the customer.
- `get_demo_context()`: Returns the narrative backstory for this demo.

Ask questions like:
- "What is the situation at {customer_name}?"
- "What problems are they facing?"
- "Show me the data."
"#
    )
}
