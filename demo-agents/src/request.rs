//! The customer brief and the instruction composed from it.

use serde::{Deserialize, Serialize};

/// A request for a new demo, straight from the form.
///
/// Fields are free text; a missing field is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub use_case: String,
}

impl DemoRequest {
    pub fn new(customer_name: &str, industry: &str, use_case: &str) -> Self {
        Self {
            customer_name: customer_name.to_string(),
            industry: industry.to_string(),
            use_case: use_case.to_string(),
        }
    }
}

/// Build the single instruction handed to a delegator.
///
/// No escaping: the fields are interpolated as given.
pub fn compose_instruction(request: &DemoRequest) -> String {
    format!(
        "Create a complete demo asset for customer '{}', who is in the '{}' industry. \
         The demo should focus on the use case: '{}'.",
        request.customer_name, request.industry, request.use_case
    )
}
