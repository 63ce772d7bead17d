use crate::sources::InterpretBlank;
use anyhow::anyhow;
use url::Url;

/// Directives of the probe policy that makes browsers report inline scripts and styles, `eval()`
/// stays allowed so that its reports don't mix in.
const UNSAFE_INLINE_PROBE: &str = "child-src 'none'; connect-src 'none'; font-src 'none'; frame-src 'none'; img-src 'none'; media-src 'none'; object-src 'none'; style-src 'none'; script-src 'unsafe-eval'";

/// Directives of the probe policy that makes browsers report `eval()`-family calls.
const UNSAFE_EVAL_PROBE: &str = "script-src 'unsafe-inline'";

/// Pair of deliberately strict policies a site is tested under. Every probe sends its reports to
/// a dedicated endpoint, so the endpoint tells how to interpret a blank `blocked-uri`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbePolicy {
    unsafe_inline: String,
    unsafe_eval: String,
}

impl ProbePolicy {
    /// Renders probe policies that report to the endpoints under `report_endpoint`.
    pub fn new(report_endpoint: &Url) -> anyhow::Result<Self> {
        Ok(Self {
            unsafe_inline: format!(
                "{UNSAFE_INLINE_PROBE}; report-uri {}",
                Self::report_uri(report_endpoint, InterpretBlank::UnsafeInline)?
            ),
            unsafe_eval: format!(
                "{UNSAFE_EVAL_PROBE}; report-uri {}",
                Self::report_uri(report_endpoint, InterpretBlank::UnsafeEval)?
            ),
        })
    }

    /// Returns the value of the `Content-Security-Policy` header for the probe whose reports
    /// should be interpreted with `blank`.
    pub fn header_value(&self, blank: InterpretBlank) -> &str {
        match blank {
            InterpretBlank::UnsafeInline => &self.unsafe_inline,
            InterpretBlank::UnsafeEval => &self.unsafe_eval,
        }
    }

    /// Returns the endpoint the probe for `blank` reports to, e.g. `<base>/unsafe-eval`.
    pub fn report_uri(report_endpoint: &Url, blank: InterpretBlank) -> anyhow::Result<Url> {
        let mut report_uri = report_endpoint.clone();
        report_uri.set_query(None);
        report_uri.set_fragment(None);
        report_uri
            .path_segments_mut()
            .map_err(|_| anyhow!("Report endpoint cannot be a base URL ({report_endpoint})."))?
            .pop_if_empty()
            .push(blank.endpoint_segment());

        Ok(report_uri)
    }
}
