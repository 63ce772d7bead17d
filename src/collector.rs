mod document_policy;
mod policy_change;
mod policy_subscription;
mod rule_collector;

pub(crate) use self::document_policy::DocumentPolicy;
pub use self::{
    document_policy::{CSP_HEADER_NAME, format_policy_details},
    policy_change::PolicyChange,
    policy_subscription::{PolicySubscription, SubscriptionId},
    rule_collector::RuleCollector,
};
