use anyhow::anyhow;
use serde_derive::{Deserialize, Serialize};
use std::str::FromStr;
use url::Url;

/// Defines how a violation report with a blank `blocked-uri` should be interpreted. Browsers
/// report inline script/style execution and `eval()`-family calls identically, so the caller has
/// to know which probe policy produced the report.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum InterpretBlank {
    /// Blank `blocked-uri` means inline script or style.
    UnsafeInline,
    /// Blank `blocked-uri` means `eval()` or a similar function.
    UnsafeEval,
}

impl InterpretBlank {
    /// Returns the source keyword a blank `blocked-uri` should be turned into.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::UnsafeInline => "'unsafe-inline'",
            Self::UnsafeEval => "'unsafe-eval'",
        }
    }

    /// Returns the last path segment of the report endpoint the corresponding probe policy
    /// sends its reports to.
    pub fn endpoint_segment(&self) -> &'static str {
        match self {
            Self::UnsafeInline => "unsafe-inline",
            Self::UnsafeEval => "unsafe-eval",
        }
    }

    /// Derives interpretation from the URL of the endpoint the report was sent to, e.g.
    /// `https://csp-collector.localhost/unsafe-eval`. Returns `None` if the URL doesn't point to
    /// one of the probe endpoints.
    pub fn from_report_endpoint(endpoint: &Url) -> Option<Self> {
        endpoint
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .next_back()
            .and_then(|segment| segment.parse().ok())
    }
}

impl FromStr for InterpretBlank {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "unsafe-inline" => Ok(Self::UnsafeInline),
            "unsafe-eval" => Ok(Self::UnsafeEval),
            _ => Err(anyhow!("Unknown blank `blocked-uri` interpretation: {value}.")),
        }
    }
}
