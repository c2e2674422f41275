//! Parser/serializer for the policy document row format.
//!
//! The grammar is a compatibility surface: it must accept exactly what the
//! upstream system's own tooling reads — `g`/`p` comma rows, the `role:`
//! prefix convention, `#` comment lines and the `policy.default=` setting.
//! All prefix handling lives here; resolution logic never touches it.

use crate::rbac::errors::PolicyError;
use crate::rbac::types::{
    PermissionRule, PolicyDocument, PolicyLine, RoleBinding, ROLE_PREFIX,
};

const DEFAULT_ROLE_KEY: &str = "policy.default";
const KIND_BINDING: &str = "g";
const KIND_RULE: &str = "p";

/// Parse raw document text into a [`PolicyDocument`].
///
/// Rows with the wrong field count for their kind, or an unknown kind, are
/// preserved verbatim and skipped — one bad line never fails the parse.
/// Only text that is not row-structured at all is rejected.
pub fn parse(raw: &str) -> Result<PolicyDocument, PolicyError> {
    if let Some(c) = raw
        .chars()
        .find(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        return Err(PolicyError::MalformedDocument {
            reason: format!("embedded control character {:?}", c),
        });
    }

    let mut lines = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            lines.push(PolicyLine::Comment(line.to_string()));
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            if key.trim() == DEFAULT_ROLE_KEY {
                let role = strip_role_prefix(value.trim());
                lines.push(PolicyLine::DefaultRole(role.to_string()));
                continue;
            }
        }
        lines.push(parse_row(line, trimmed));
    }

    Ok(PolicyDocument::from_lines(lines))
}

/// Parse one comma-separated row, falling back to verbatim passthrough.
fn parse_row(original: &str, trimmed: &str) -> PolicyLine {
    let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();

    match fields[0] {
        KIND_BINDING if fields.len() == 3 => {
            let subject = fields[1];
            let role = strip_role_prefix(fields[2]);
            if !subject.is_empty() && !role.is_empty() {
                return PolicyLine::Binding(RoleBinding {
                    subject: subject.to_string(),
                    role: role.to_string(),
                });
            }
        }
        KIND_RULE if fields.len() == 4 || fields.len() == 5 => {
            let role = strip_role_prefix(fields[1]);
            if !role.is_empty() {
                return PolicyLine::Rule(PermissionRule {
                    role: role.to_string(),
                    resource: fields[2].to_string(),
                    action: fields[3].to_string(),
                    effect: fields.get(4).map(|s| s.to_string()),
                });
            }
        }
        _ => {}
    }

    tracing::debug!(row = original, "preserving unparsed policy row");
    PolicyLine::Raw(original.to_string())
}

/// Serialize a [`PolicyDocument`] back to document text, re-adding the
/// `role:` prefix and passing comments and unparsed rows through verbatim.
pub fn serialize(doc: &PolicyDocument) -> String {
    let mut out = String::new();
    for line in doc.lines() {
        match line {
            PolicyLine::Binding(b) => {
                out.push_str(&format!("g, {}, {}{}\n", b.subject, ROLE_PREFIX, b.role));
            }
            PolicyLine::Rule(r) => {
                out.push_str(&format!(
                    "p, {}{}, {}, {}",
                    ROLE_PREFIX, r.role, r.resource, r.action
                ));
                if let Some(effect) = &r.effect {
                    out.push_str(&format!(", {}", effect));
                }
                out.push('\n');
            }
            PolicyLine::DefaultRole(role) => {
                if role.is_empty() {
                    out.push_str(&format!("{}=\n", DEFAULT_ROLE_KEY));
                } else {
                    out.push_str(&format!("{}={}{}\n", DEFAULT_ROLE_KEY, ROLE_PREFIX, role));
                }
            }
            PolicyLine::Comment(text) | PolicyLine::Raw(text) => {
                out.push_str(text);
                out.push('\n');
            }
        }
    }
    out
}

fn strip_role_prefix(field: &str) -> &str {
    field.strip_prefix(ROLE_PREFIX).unwrap_or(field)
}
