use crate::{
    collector::{
        DocumentPolicy, PolicyChange, PolicySubscription, SubscriptionId,
        policy_subscription::PolicySubscribers,
    },
    error::Error,
    reports::ViolationReport,
    sources::{InterpretBlank, SourceToken},
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard},
};
use tracing::{debug, warn};

/// Collects policy rules from violation reports, one policy per document URI. Safe to share
/// between threads (`Arc<RuleCollector>`) and to call concurrently.
#[derive(Debug, Default)]
pub struct RuleCollector {
    policies: RwLock<HashMap<String, DocumentPolicy>>,
    subscribers: Mutex<PolicySubscribers>,
}

impl RuleCollector {
    /// Creates a collector without any policies or subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule derived from the violation report to the policy of the report's document.
    /// Returns `true` if the policy changed, in which case all subscribers are notified. Rejected
    /// reports leave the collected policies untouched.
    pub fn add(&self, report: &ViolationReport, blank: InterpretBlank) -> Result<bool, Error> {
        if report.document_uri.trim().is_empty() {
            warn!("Ignored violation report with an empty document URI.");
            return Err(Error::invalid_document(
                "Violation report document URI cannot be empty.",
            ));
        }

        let directive = report.directive_name();
        if directive.is_empty() {
            warn!(
                report = %report.log_context(),
                "Ignored malformed violation report without directive."
            );
            return Err(Error::malformed_report(
                "Violation report doesn't specify violated directive.",
            ));
        }

        let source = SourceToken::from_report(report, blank).inspect_err(|err| {
            warn!(report = %report.log_context(), "Ignored malformed violation report: {err}");
        })?;

        let mut policies = self
            .policies
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let policy = policies.entry(report.document_uri.clone()).or_default();
        if !policy.insert(directive, source) {
            debug!(
                report = %report.log_context(),
                "Violation report doesn't change the policy."
            );
            return Ok(false);
        }

        let change = PolicyChange {
            document_uri: report.document_uri.clone(),
            policy: policy.to_string(),
        };

        // Lock subscribers before the policies are released so that notifications are delivered
        // in the same order the changes were made.
        let mut subscribers = self.lock_subscribers();
        drop(policies);

        debug!(
            report = %report.log_context(),
            policy = %change.policy,
            "Policy changed."
        );
        subscribers.notify(&change);

        Ok(true)
    }

    /// Returns the rendered policy for the document, or `None` if there were no reports for it.
    pub fn get(&self, document_uri: &str) -> Result<Option<String>, Error> {
        if document_uri.trim().is_empty() {
            warn!("Cannot retrieve policy for an empty document URI.");
            return Err(Error::invalid_document("Document URI cannot be empty."));
        }

        Ok(self
            .read_policies()
            .get(document_uri)
            .map(|policy| policy.to_string()))
    }

    /// Returns URIs of all documents with collected policies, sorted.
    pub fn documents(&self) -> Vec<String> {
        let mut documents = self.read_policies().keys().cloned().collect::<Vec<_>>();
        documents.sort();
        documents
    }

    /// Returns rendered policies of all documents, taken at the same point in time.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.read_policies()
            .iter()
            .map(|(document_uri, policy)| (document_uri.clone(), policy.to_string()))
            .collect()
    }

    /// Subscribes to policy change notifications.
    pub fn subscribe(&self) -> PolicySubscription {
        self.lock_subscribers().subscribe()
    }

    /// Cancels subscription. Returns `false` if it's not active.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock_subscribers().unsubscribe(id)
    }

    /// Returns the number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    // Every write is a single set insertion, so the policies stay consistent even if a thread
    // panicked while holding the lock.
    fn read_policies(&self) -> RwLockReadGuard<'_, HashMap<String, DocumentPolicy>> {
        self.policies.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, PolicySubscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
