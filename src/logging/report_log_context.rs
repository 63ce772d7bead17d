use crate::reports::ViolationReport;
use serde_derive::Serialize;
use std::fmt::{Display, Formatter};

/// Represents a context for the violation report used for the structured logging. Carries the
/// diagnostic fields that don't take part in the policy aggregation.
#[derive(Serialize, Debug, Copy, Clone, PartialEq)]
pub struct ReportLogContext<'a> {
    /// URI of the document in which the violation occurred.
    pub document_uri: &'a str,
    /// Resolved name of the violated directive.
    pub directive: &'a str,
    /// URI of the blocked resource, as reported.
    #[serde(skip_serializing_if = "str::is_empty")]
    pub blocked_uri: &'a str,
    /// URL of the resource where the violation occurred.
    #[serde(skip_serializing_if = "str::is_empty")]
    pub source_file: &'a str,
    /// Line number in the source file.
    #[serde(skip_serializing_if = "is_zero")]
    pub line_number: u32,
    /// Column number in the source file.
    #[serde(skip_serializing_if = "is_zero")]
    pub column_number: u32,
    /// Sample of the blocked inline script or style.
    #[serde(skip_serializing_if = "str::is_empty")]
    pub script_sample: &'a str,
    /// Referrer of the document.
    #[serde(skip_serializing_if = "str::is_empty")]
    pub referrer: &'a str,
    /// HTTP status code of the document.
    #[serde(skip_serializing_if = "is_zero")]
    pub status_code: u16,
}

fn is_zero<T: Into<u32> + Copy>(value: &T) -> bool {
    (*value).into() == 0
}

impl ViolationReport {
    /// Returns context used for the structured logging.
    pub fn log_context(&self) -> ReportLogContext<'_> {
        ReportLogContext {
            document_uri: &self.document_uri,
            directive: self.directive_name(),
            blocked_uri: &self.blocked_uri,
            source_file: &self.source_file,
            line_number: self.line_number,
            column_number: self.column_number,
            script_sample: &self.script_sample,
            referrer: &self.referrer,
            status_code: self.status_code,
        }
    }
}

impl Display for ReportLogContext<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&serde_json::to_string(self).map_err(|_| std::fmt::Error)?)
    }
}
