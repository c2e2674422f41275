//! Idempotent grant/revoke mutations of the policy document.
//!
//! Both mutators are pure value transformations: they never modify the input
//! document and never perform I/O, so a failed write-back leaves no
//! observable side effect on the caller's in-memory model. The caller
//! serializes and saves only when the outcome is `Applied`.

use crate::rbac::types::{
    GrantOutcome, PolicyDocument, PolicyLine, RevokeOutcome, RoleBinding,
};

/// Add an explicit role binding.
///
/// Additive: a subject may hold multiple simultaneous explicit roles, so the
/// new binding is appended and existing bindings are left untouched —
/// revocation is a separate, explicit operation. Granting an already-present
/// binding is a no-op reported as `AlreadyExists`; no duplicate row is ever
/// introduced.
pub fn grant(doc: &PolicyDocument, subject: &str, role: &str) -> (PolicyDocument, GrantOutcome) {
    if doc.has_binding(subject, role) {
        return (doc.clone(), GrantOutcome::AlreadyExists);
    }

    let mut lines = doc.lines().to_vec();
    lines.push(PolicyLine::Binding(RoleBinding {
        subject: subject.to_string(),
        role: role.to_string(),
    }));
    (PolicyDocument::from_lines(lines), GrantOutcome::Applied)
}

/// Remove an explicit role binding.
///
/// The default role cannot be revoked by document mutation — it is implicit,
/// and removing it would require changing the global default-role setting,
/// out of scope for a single-subject operation. A subject with no matching
/// explicit binding (including one that only inherits the default role)
/// reports `AlreadyRevoked`. Removal is defensive against duplicate rows:
/// every matching binding is dropped. A subject left with zero explicit
/// bindings falls back to the default role on the next resolution; no
/// binding is written for that.
pub fn revoke(doc: &PolicyDocument, subject: &str, role: &str) -> (PolicyDocument, RevokeOutcome) {
    if doc.default_role() == Some(role) {
        return (doc.clone(), RevokeOutcome::AlreadyRevoked);
    }

    let mut removed = 0usize;
    let lines: Vec<PolicyLine> = doc
        .lines()
        .iter()
        .filter(|line| match line {
            PolicyLine::Binding(b) if b.subject == subject && b.role == role => {
                removed += 1;
                false
            }
            _ => true,
        })
        .cloned()
        .collect();

    if removed == 0 {
        return (doc.clone(), RevokeOutcome::AlreadyRevoked);
    }

    (PolicyDocument::from_lines(lines), RevokeOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::codec::{parse, serialize};

    #[test]
    fn test_grant_appends_binding() {
        let doc = parse("g, alice, role:admin\n").unwrap();
        let (updated, outcome) = grant(&doc, "bob", "dev");
        assert_eq!(outcome, GrantOutcome::Applied);
        assert!(updated.has_binding("bob", "dev"));
        // Input document is untouched.
        assert!(!doc.has_binding("bob", "dev"));
    }

    #[test]
    fn test_grant_is_idempotent() {
        let doc = parse("").unwrap();
        let (after_first, first) = grant(&doc, "alice", "admin");
        let (after_second, second) = grant(&after_first, "alice", "admin");
        assert_eq!(first, GrantOutcome::Applied);
        assert_eq!(second, GrantOutcome::AlreadyExists);
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn test_grant_is_additive() {
        let doc = parse("g, alice, role:readonly\n").unwrap();
        let (updated, outcome) = grant(&doc, "alice", "admin");
        assert_eq!(outcome, GrantOutcome::Applied);
        assert!(updated.has_binding("alice", "readonly"));
        assert!(updated.has_binding("alice", "admin"));
    }

    #[test]
    fn test_grant_preserves_unrelated_lines() {
        let raw = "# managed by ops\np, role:admin, apps, *, allow\nbad,row\n";
        let doc = parse(raw).unwrap();
        let (updated, _) = grant(&doc, "alice", "admin");
        let out = serialize(&updated);
        assert!(out.starts_with("# managed by ops\n"));
        assert!(out.contains("bad,row"));
        assert!(out.ends_with("g, alice, role:admin\n"));
    }

    #[test]
    fn test_revoke_removes_binding() {
        let doc = parse("g, alice, role:admin\ng, alice, role:dev\n").unwrap();
        let (updated, outcome) = revoke(&doc, "alice", "admin");
        assert_eq!(outcome, RevokeOutcome::Applied);
        assert!(!updated.has_binding("alice", "admin"));
        assert!(updated.has_binding("alice", "dev"));
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let doc = parse("g, alice, role:admin\ng, alice, role:dev\n").unwrap();
        let (after_first, first) = revoke(&doc, "alice", "admin");
        let (after_second, second) = revoke(&after_first, "alice", "admin");
        assert_eq!(first, RevokeOutcome::Applied);
        assert_eq!(second, RevokeOutcome::AlreadyRevoked);
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn test_revoke_default_role_is_noop() {
        let doc = parse("g, alice, role:readonly\npolicy.default=role:readonly\n").unwrap();
        let (updated, outcome) = revoke(&doc, "alice", "readonly");
        assert_eq!(outcome, RevokeOutcome::AlreadyRevoked);
        assert_eq!(updated, doc);
    }

    #[test]
    fn test_revoke_subject_on_default_floor() {
        // bob has no explicit binding at all, only the implicit default.
        let doc = parse("g, alice, role:admin\npolicy.default=role:readonly\n").unwrap();
        let (updated, outcome) = revoke(&doc, "bob", "admin");
        assert_eq!(outcome, RevokeOutcome::AlreadyRevoked);
        assert_eq!(updated, doc);
    }

    #[test]
    fn test_revoke_unheld_role_with_other_explicit_roles() {
        let doc = parse("g, alice, role:dev\n").unwrap();
        let (updated, outcome) = revoke(&doc, "alice", "admin");
        assert_eq!(outcome, RevokeOutcome::AlreadyRevoked);
        assert_eq!(updated, doc);
    }

    #[test]
    fn test_revoke_drops_duplicate_rows() {
        let doc = parse("g, alice, role:dev\ng, alice, role:dev\ng, bob, role:dev\n").unwrap();
        let (updated, outcome) = revoke(&doc, "alice", "dev");
        assert_eq!(outcome, RevokeOutcome::Applied);
        assert!(!updated.has_binding("alice", "dev"));
        assert!(updated.has_binding("bob", "dev"));
    }

    #[test]
    fn test_revoke_preserves_unrelated_lines() {
        let raw = "# keep me\ng, alice, role:dev\nmystery,row\n";
        let doc = parse(raw).unwrap();
        let (updated, _) = revoke(&doc, "alice", "dev");
        let out = serialize(&updated);
        assert_eq!(out, "# keep me\nmystery,row\n");
    }
}
