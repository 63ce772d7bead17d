use serde_derive::Deserialize;
use serde_with::{DefaultOnError, DefaultOnNull, DisplayFromStr, PickFirst, serde_as};

/// Wrapper object browsers send to the `report-uri` endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RawViolationReportEnvelope {
    #[serde(rename = "csp-report")]
    pub csp_report: RawViolationReport,
}

/// Raw violation report exactly as it's sent by the browser. Every field is optional since
/// different browsers (and browser versions) populate different subsets of fields.
#[serde_as]
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RawViolationReport {
    #[serde(default)]
    pub document_uri: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub blocked_uri: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub violated_directive: String,
    #[serde(default)]
    pub effective_directive: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub original_policy: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub source_file: String,
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub line_number: u32,
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub column_number: u32,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub script_sample: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub referrer: String,
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub status_code: u16,
}
