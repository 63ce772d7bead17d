use serde_derive::{Deserialize, Serialize};
use url::Url;

/// Configuration for the probe policies.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// Base URL the probe policies send violation reports to. Reports for the inline probe go to
    /// `<base>/unsafe-inline` and for the eval probe to `<base>/unsafe-eval`.
    pub report_endpoint: Url,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            report_endpoint: Url::parse("https://csp-collector.localhost/")
                .expect("Cannot parse probe report endpoint parameter."),
        }
    }
}
