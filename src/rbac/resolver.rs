//! Effective role-membership resolution.
//!
//! Pure functions over a [`PolicyDocument`] snapshot and the current account
//! list — no I/O, fully unit-testable without a backing store.

use crate::accounts::Account;
use crate::rbac::classify::classify;
use crate::rbac::types::{ClassifiedSubject, MembershipSource, PolicyDocument, SubjectKind};
use std::collections::{HashMap, HashSet};

/// Resolve the set of subjects effectively holding `role_name`.
///
/// Explicit members come first, in document order. If `role_name` is the
/// configured default role, every local account with zero explicit bindings
/// to *any* role joins as an implicit member — an account holding an
/// explicit binding to a different role never receives the default role
/// implicitly. Explicit membership wins for display metadata.
pub fn subjects_for_role(
    doc: &PolicyDocument,
    role_name: &str,
    accounts: &[Account],
) -> Vec<ClassifiedSubject> {
    let known: HashSet<String> = accounts.iter().map(|a| a.name.clone()).collect();
    let enabled_by_name: HashMap<&str, bool> =
        accounts.iter().map(|a| (a.name.as_str(), a.enabled)).collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut members = Vec::new();

    for binding in doc.bindings().filter(|b| b.role == role_name) {
        if !seen.insert(binding.subject.clone()) {
            continue;
        }
        let kind = classify(&binding.subject, &known);
        members.push(ClassifiedSubject {
            subject: binding.subject.clone(),
            kind,
            source: MembershipSource::Explicit,
            enabled: match kind {
                SubjectKind::Local => enabled_by_name.get(binding.subject.as_str()).copied(),
                SubjectKind::External => None,
            },
        });
    }

    if doc.default_role() == Some(role_name) {
        // Default-role eligibility is global: having an explicit binding to
        // any role at all removes an account from the implicit set.
        let explicitly_bound: HashSet<&str> =
            doc.bindings().map(|b| b.subject.as_str()).collect();

        for account in accounts {
            if explicitly_bound.contains(account.name.as_str()) {
                continue;
            }
            if !seen.insert(account.name.clone()) {
                continue;
            }
            members.push(ClassifiedSubject {
                subject: account.name.clone(),
                kind: SubjectKind::Local,
                source: MembershipSource::DefaultRole,
                enabled: Some(account.enabled),
            });
        }
    }

    members
}

/// Resolve the set of roles effectively held by `subject_name`: explicit
/// roles in document order, or exactly the default role when the subject has
/// no explicit binding at all. The default role is never layered on top of
/// explicit roles.
pub fn roles_for_subject(doc: &PolicyDocument, subject_name: &str) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut roles = Vec::new();

    for binding in doc.bindings().filter(|b| b.subject == subject_name) {
        if seen.insert(binding.role.as_str()) {
            roles.push(binding.role.clone());
        }
    }

    if roles.is_empty() {
        if let Some(default) = doc.default_role() {
            roles.push(default.to_string());
        }
    }

    roles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::codec::parse;

    fn account(name: &str) -> Account {
        Account {
            name: name.into(),
            enabled: true,
            capabilities: Vec::new(),
        }
    }

    fn subjects(members: &[ClassifiedSubject]) -> Vec<&str> {
        members.iter().map(|m| m.subject.as_str()).collect()
    }

    #[test]
    fn test_explicit_members_in_document_order() {
        let doc = parse("g, carol, role:dev\ng, alice, role:dev\ng, bob, role:ops\n").unwrap();
        let accounts = [account("alice"), account("bob"), account("carol")];
        let members = subjects_for_role(&doc, "dev", &accounts);
        assert_eq!(subjects(&members), vec!["carol", "alice"]);
        assert!(members
            .iter()
            .all(|m| m.source == MembershipSource::Explicit));
    }

    #[test]
    fn test_classification_precedence() {
        let doc = parse("g, bob, role:dev\ng, group-x, role:dev\n").unwrap();
        let accounts = [account("bob")];
        let members = subjects_for_role(&doc, "dev", &accounts);
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].kind, SubjectKind::Local);
        assert_eq!(members[0].enabled, Some(true));
        assert_eq!(members[1].kind, SubjectKind::External);
        assert_eq!(members[1].enabled, None);
    }

    #[test]
    fn test_default_role_includes_unbound_accounts() {
        let doc = parse("g, alice, role:admin\npolicy.default=role:readonly\n").unwrap();
        let accounts = [account("alice"), account("bob")];

        // alice has an explicit binding elsewhere, so only bob inherits.
        let members = subjects_for_role(&doc, "readonly", &accounts);
        assert_eq!(subjects(&members), vec!["bob"]);
        assert_eq!(members[0].source, MembershipSource::DefaultRole);

        let admins = subjects_for_role(&doc, "admin", &accounts);
        assert_eq!(subjects(&admins), vec!["alice"]);
    }

    #[test]
    fn test_explicit_default_binding_not_double_counted() {
        let doc = parse("g, alice, role:readonly\npolicy.default=role:readonly\n").unwrap();
        let accounts = [account("alice"), account("bob")];
        let members = subjects_for_role(&doc, "readonly", &accounts);
        assert_eq!(subjects(&members), vec!["alice", "bob"]);
        assert_eq!(members[0].source, MembershipSource::Explicit);
        assert_eq!(members[1].source, MembershipSource::DefaultRole);
    }

    #[test]
    fn test_duplicate_bindings_resolve_once() {
        let doc = parse("g, alice, role:dev\ng, alice, role:dev\n").unwrap();
        let members = subjects_for_role(&doc, "dev", &[account("alice")]);
        assert_eq!(members.len(), 1);
    }

    #[test]
    fn test_no_default_role_no_implicit_members() {
        let doc = parse("g, alice, role:dev\n").unwrap();
        let members = subjects_for_role(&doc, "readonly", &[account("alice"), account("bob")]);
        assert!(members.is_empty());
    }

    #[test]
    fn test_roles_for_subject_explicit() {
        let doc =
            parse("g, alice, role:dev\ng, alice, role:ops\npolicy.default=role:readonly\n")
                .unwrap();
        // Default role is not added on top of explicit roles.
        assert_eq!(roles_for_subject(&doc, "alice"), vec!["dev", "ops"]);
    }

    #[test]
    fn test_roles_for_subject_default_fallback() {
        let doc = parse("g, alice, role:dev\npolicy.default=role:readonly\n").unwrap();
        assert_eq!(roles_for_subject(&doc, "bob"), vec!["readonly"]);
    }

    #[test]
    fn test_roles_for_subject_no_default() {
        let doc = parse("g, alice, role:dev\n").unwrap();
        assert!(roles_for_subject(&doc, "bob").is_empty());
    }

    #[test]
    fn test_end_to_end_scenario() {
        // The document carries a permission rule, an explicit binding and a
        // default-role setting; alice is excluded from the default set
        // because she holds an explicit binding elsewhere.
        let doc = parse("p, role:admin, apps, *, allow\ng, alice, role:admin\npolicy.default=role:readonly\n")
            .unwrap();
        let accounts = [account("alice"), account("bob")];

        let admins = subjects_for_role(&doc, "admin", &accounts);
        assert_eq!(subjects(&admins), vec!["alice"]);
        assert_eq!(admins[0].kind, SubjectKind::Local);

        let readers = subjects_for_role(&doc, "readonly", &accounts);
        assert_eq!(subjects(&readers), vec!["bob"]);
        assert_eq!(readers[0].kind, SubjectKind::Local);
    }
}
