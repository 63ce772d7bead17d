use serde_derive::Serialize;

/// Notification sent to subscribers every time the policy of a document changes.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyChange {
    /// URI of the document whose policy changed.
    pub document_uri: String,
    /// Rendered policy, including the header name.
    pub policy: String,
}
