use crate::sources::SourceToken;
use itertools::Itertools;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
    iter,
};

/// Name of the HTTP header the rendered policy is meant for.
pub const CSP_HEADER_NAME: &str = "Content-Security-Policy";

/// Directive every rendered policy starts with, regardless of the collected rules.
const BASELINE_DIRECTIVE: &str = "default-src 'none'";

/// Policy collected for a single document: a set of allowed sources per directive. Sources are
/// only ever added, never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPolicy {
    directives: BTreeMap<String, BTreeSet<SourceToken>>,
}

impl DocumentPolicy {
    /// Adds source to the directive. Returns `false` if the directive already allows it.
    pub fn insert(&mut self, directive: &str, source: SourceToken) -> bool {
        match self.directives.get_mut(directive) {
            Some(sources) => sources.insert(source),
            None => {
                self.directives
                    .insert(directive.to_string(), BTreeSet::from([source]));
                true
            }
        }
    }

    /// Returns policy as a value of the `Content-Security-Policy` header, e.g.
    /// `default-src 'none'; img-src 'self' ssl.google-analytics.com`.
    pub fn header_value(&self) -> String {
        iter::once(BASELINE_DIRECTIVE.to_string())
            .chain(
                self.directives
                    .iter()
                    .filter(|(_, sources)| !sources.is_empty())
                    .map(|(name, sources)| format!("{name} {}", sources.iter().join(" "))),
            )
            .join("; ")
    }
}

impl Display for DocumentPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{CSP_HEADER_NAME}: {}", self.header_value())
    }
}

/// Turns a rendered policy (with or without the header name) into the multi-line form.
pub fn format_policy_details(policy: &str) -> String {
    policy
        .strip_prefix(CSP_HEADER_NAME)
        .and_then(|policy| policy.strip_prefix(": "))
        .unwrap_or(policy)
        .split("; ")
        .map(|directive| directive.split(' ').join("\n\t"))
        .join("\n\n")
}
