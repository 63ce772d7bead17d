use crate::{
    error::Error,
    reports::raw_violation_report::{RawViolationReport, RawViolationReportEnvelope},
};
use anyhow::Context;

/// Normalized CSP violation report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationReport {
    /// URI of the document in which the violation occurred.
    pub document_uri: String,
    /// URI of the resource that was blocked. Can be empty, an absolute URL, or one of the
    /// non-standard literals some browsers send instead (`self`, `inline`, `eval`).
    pub blocked_uri: String,
    /// Directive whose enforcement caused the violation, as reported by the browser. Some
    /// browsers glue two `directive 'keyword'` fragments together without a separator, so only
    /// the first token is reliable.
    pub violated_directive: String,
    /// Directive whose enforcement caused the violation (CSP level 2+ browsers only).
    pub effective_directive: Option<String>,
    /// Policy the document was protected by.
    pub original_policy: String,
    /// URL of the resource where the violation occurred.
    pub source_file: String,
    /// Line number in `source_file` where the violation occurred.
    pub line_number: u32,
    /// Column number in `source_file` where the violation occurred.
    pub column_number: u32,
    /// First characters of the inline script or style that caused the violation.
    pub script_sample: String,
    /// Referrer of the document in which the violation occurred.
    pub referrer: String,
    /// HTTP status code of the resource on which the global object was instantiated.
    pub status_code: u16,
}

impl ViolationReport {
    /// Parses a raw `{"csp-report": {...}}` payload.
    pub fn parse(raw_report: &str) -> Result<Self, Error> {
        serde_json::from_str::<RawViolationReportEnvelope>(raw_report)
            .context("Violation report isn't a valid `csp-report` JSON object.")
            .map_err(Error::malformed_report_with_root_cause)
            .and_then(|envelope| Self::try_from(envelope.csp_report))
    }

    /// Same as [`ViolationReport::parse`], but for a payload that has already been decoded into
    /// a JSON value.
    pub fn from_json(raw_report: serde_json::Value) -> Result<Self, Error> {
        serde_json::from_value::<RawViolationReportEnvelope>(raw_report)
            .context("Violation report isn't a valid `csp-report` JSON object.")
            .map_err(Error::malformed_report_with_root_cause)
            .and_then(|envelope| Self::try_from(envelope.csp_report))
    }

    /// Returns the name of the directive the report is about: effective directive if the browser
    /// supports it, otherwise the first token of the violated directive.
    pub fn directive_name(&self) -> &str {
        self.effective_directive
            .as_deref()
            .and_then(first_directive_token)
            .or_else(|| first_directive_token(&self.violated_directive))
            .unwrap_or_default()
    }
}

/// Directive names can't contain whitespace or `;`, anything after them isn't part of the name.
fn first_directive_token(value: &str) -> Option<&str> {
    value
        .split(|c: char| c.is_whitespace() || c == ';')
        .find(|token| !token.is_empty())
}

impl TryFrom<RawViolationReport> for ViolationReport {
    type Error = Error;

    fn try_from(raw: RawViolationReport) -> Result<Self, Self::Error> {
        let document_uri = match raw.document_uri {
            Some(document_uri) if !document_uri.trim().is_empty() => document_uri,
            Some(_) => {
                return Err(Error::malformed_report(
                    "Violation report `document-uri` cannot be empty.",
                ));
            }
            None => {
                return Err(Error::malformed_report(
                    "Violation report doesn't have `document-uri`.",
                ));
            }
        };

        Ok(Self {
            document_uri,
            blocked_uri: raw.blocked_uri,
            violated_directive: raw.violated_directive,
            effective_directive: raw
                .effective_directive
                .filter(|directive| !directive.trim().is_empty()),
            original_policy: raw.original_policy,
            source_file: raw.source_file,
            line_number: raw.line_number,
            column_number: raw.column_number,
            script_sample: raw.script_sample,
            referrer: raw.referrer,
            status_code: raw.status_code,
        })
    }
}
