/// Describes CSP collector specific error types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Violation report doesn't have the expected shape or cannot be turned into a policy rule.
    MalformedReport,
    /// Document URI is empty or otherwise unusable as a policy key.
    InvalidDocument,
    /// Unknown error.
    Unknown,
}
