//! Local-vs-external subject classification.
//!
//! The policy document is agnostic to identity source: any subject that is
//! not a known local account is assumed to originate from an external
//! identity provider (e.g. an SSO group) and is represented differently
//! downstream. Classification is a pure function and is re-evaluated on
//! every resolution, since the account list can change between calls.

use crate::rbac::types::SubjectKind;
use std::collections::HashSet;

/// Classify a subject against the set of known local account names.
///
/// A subject is `Local` iff it exactly matches a known account name —
/// case-sensitive, no normalization. A name that collides between the local
/// and external namespaces classifies as `Local`: local match takes
/// precedence by policy, not as a failure fallback.
pub fn classify(subject: &str, known_accounts: &HashSet<String>) -> SubjectKind {
    if known_accounts.contains(subject) {
        SubjectKind::Local
    } else {
        SubjectKind::External
    }
}
