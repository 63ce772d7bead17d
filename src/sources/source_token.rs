use crate::{error::Error, reports::ViolationReport, sources::InterpretBlank};
use anyhow::anyhow;
use serde_derive::Serialize;
use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
};
use url::Url;

const SELF_KEYWORD: &str = "'self'";
const UNSAFE_INLINE_KEYWORD: &str = "'unsafe-inline'";
const UNSAFE_EVAL_KEYWORD: &str = "'unsafe-eval'";

/// Schemes CSP level 3 browsers report on their own, without the rest of the URL.
const BARE_SCHEMES: [&str; 5] = ["about", "blob", "data", "filesystem", "mediastream"];

/// Canonical CSP source expression: a quoted keyword (`'self'`, `'unsafe-inline'`), a host
/// source without scheme and path (`www.google-analytics.com`, `localhost:8080`), or a scheme
/// source (`data:`).
///
/// Tokens are ordered by their text with surrounding quotes ignored, so keywords interleave
/// with host names: `az416426.vo.msecnd.net` < `'self'` < `www.google-analytics.com`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SourceToken(String);

impl SourceToken {
    /// Computes the source expression that would allow the resource blocked in the report.
    pub fn from_report(report: &ViolationReport, blank: InterpretBlank) -> Result<Self, Error> {
        match report.blocked_uri.as_str() {
            // Some browsers report `self` instead of the document URL.
            "self" => return Ok(Self::from(SELF_KEYWORD)),
            "" => return Ok(Self::from(blank.keyword())),
            // CSP level 3 browsers send these literals instead of a blank `blocked-uri`.
            "inline" => return Ok(Self::from(UNSAFE_INLINE_KEYWORD)),
            "eval" => return Ok(Self::from(UNSAFE_EVAL_KEYWORD)),
            scheme if BARE_SCHEMES.contains(&scheme) => return Ok(Self(format!("{scheme}:"))),
            _ => {}
        }

        let document_url = Url::parse(&report.document_uri).ok();
        let blocked_url = match Url::parse(&report.blocked_uri) {
            Ok(blocked_url) => blocked_url,
            Err(err) => document_url
                .as_ref()
                .and_then(|document_url| document_url.join(&report.blocked_uri).ok())
                .ok_or_else(|| {
                    Error::malformed_report_with_root_cause(anyhow!(err).context(format!(
                        "Cannot parse blocked URI ({}).",
                        report.blocked_uri
                    )))
                })?,
        };

        // URLs without authority (`data:`, `blob:`, `about:`) can only be allowed by scheme.
        let Some(host) = blocked_url.host_str() else {
            return Ok(Self(format!("{}:", blocked_url.scheme())));
        };

        if let Some(document_url) = document_url
            && document_url.origin() == blocked_url.origin()
        {
            return Ok(Self::from(SELF_KEYWORD));
        }

        // `Url::port` is `None` when the port is the default one for the scheme.
        Ok(Self(match blocked_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }))
    }

    /// Returns the token as it should appear in the policy.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn comparison_key(&self) -> &str {
        self.0.trim_matches('\'')
    }
}

impl From<&str> for SourceToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for SourceToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for SourceToken {
    fn cmp(&self, other: &Self) -> Ordering {
        self.comparison_key()
            .cmp(other.comparison_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for SourceToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
