use crate::{error::Error, reports::ViolationReport};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Violation report captured on its way to one of the probe report endpoints.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CapturedReport {
    /// URL the report was sent to.
    pub endpoint: Url,
    /// Report payload: either the raw request body as a string, or an already decoded
    /// `{"csp-report": {...}}` object.
    pub body: Value,
}

impl CapturedReport {
    /// Parses violation report from the payload.
    pub fn violation_report(&self) -> Result<ViolationReport, Error> {
        match &self.body {
            Value::String(body) => ViolationReport::parse(body),
            body => ViolationReport::from_json(body.clone()),
        }
    }
}
