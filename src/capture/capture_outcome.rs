use crate::error::ErrorKind;

/// Result of processing a captured violation report.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CaptureOutcome {
    /// Collection is disabled, report was ignored.
    Disabled,
    /// Report wasn't sent to one of the probe endpoints.
    NotAReport,
    /// Report couldn't be parsed or was rejected by the collector.
    Rejected(ErrorKind),
    /// Report didn't add anything new to the policy.
    Duplicate,
    /// Report extended the policy.
    Added,
}
