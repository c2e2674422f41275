use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Document-format prefix on role fields (`role:admin`). Stripped on parse,
/// re-added on serialize; resolution logic never sees it.
pub const ROLE_PREFIX: &str = "role:";

/// A "this subject has this role" fact, one `g` row in the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleBinding {
    pub subject: String,
    /// Role name without the `role:` prefix.
    pub role: String,
}

/// A role's permission grant, one `p` row. Consumed only to discover role
/// names — a role that exists purely as a permission-holder with zero
/// subjects must still be listed as a known role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRule {
    pub role: String,
    pub resource: String,
    pub action: String,
    pub effect: Option<String>,
}

/// One line of the policy document, in document order.
///
/// `Comment` and `Raw` carry the original line verbatim so that serialization
/// passes through everything the engine does not own — unrelated tooling may
/// depend on those lines surviving a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyLine {
    Binding(RoleBinding),
    Rule(PermissionRule),
    /// `policy.default=<role>` setting. An empty value means "no default".
    DefaultRole(String),
    Comment(String),
    /// A row the codec could not type: wrong field count or unknown kind.
    Raw(String),
}

/// The full parsed state of the access-control document.
///
/// Ephemeral by design: reconstructed from the backing store on every read,
/// mutated in memory, discarded after save. Line order is preserved except
/// where a mutation explicitly adds or removes a binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyDocument {
    lines: Vec<PolicyLine>,
}

impl PolicyDocument {
    pub fn from_lines(lines: Vec<PolicyLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[PolicyLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<PolicyLine> {
        self.lines
    }

    pub fn bindings(&self) -> impl Iterator<Item = &RoleBinding> {
        self.lines.iter().filter_map(|line| match line {
            PolicyLine::Binding(b) => Some(b),
            _ => None,
        })
    }

    pub fn rules(&self) -> impl Iterator<Item = &PermissionRule> {
        self.lines.iter().filter_map(|line| match line {
            PolicyLine::Rule(r) => Some(r),
            _ => None,
        })
    }

    /// The configured default role, if any. When the document carries several
    /// `policy.default` lines the last one wins; an empty value means none.
    pub fn default_role(&self) -> Option<&str> {
        self.lines
            .iter()
            .rev()
            .find_map(|line| match line {
                PolicyLine::DefaultRole(role) => Some(role.as_str()),
                _ => None,
            })
            .filter(|role| !role.is_empty())
    }

    /// All known role names: every role referenced by a binding or a
    /// permission rule, plus the default role. Sorted, unique.
    pub fn role_names(&self) -> Vec<String> {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        for binding in self.bindings() {
            if !binding.role.is_empty() {
                names.insert(&binding.role);
            }
        }
        for rule in self.rules() {
            if !rule.role.is_empty() {
                names.insert(&rule.role);
            }
        }
        if let Some(default) = self.default_role() {
            names.insert(default);
        }
        names.into_iter().map(String::from).collect()
    }

    /// True if the document contains an explicit binding of `role` to `subject`.
    pub fn has_binding(&self, subject: &str, role: &str) -> bool {
        self.bindings()
            .any(|b| b.subject == subject && b.role == role)
    }
}

/// Whether a subject resolved to a locally-managed account or an
/// externally-sourced identity (e.g. a federated group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Local,
    External,
}

/// How a subject came to hold a role: a binding physically present in the
/// document, or the default-role fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipSource {
    Explicit,
    DefaultRole,
}

/// A resolved member of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedSubject {
    pub subject: String,
    pub kind: SubjectKind,
    pub source: MembershipSource,
    /// Pass-through metadata from the account record for local subjects.
    /// Never consulted by resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Outcome of a grant mutation. `AlreadyExists` is a first-class no-op
/// result, not an error — callers must perform no write-back for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantOutcome {
    Applied,
    AlreadyExists,
}

/// Outcome of a revoke mutation, symmetric with [`GrantOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokeOutcome {
    Applied,
    AlreadyRevoked,
}
