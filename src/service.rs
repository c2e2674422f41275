//! Reconciliation service: wires the pure RBAC core to the store and
//! account ports.
//!
//! Every operation re-fetches current state from the store immediately
//! before acting — there is no cache, and a document fetched for one call is
//! never reused for another, since staleness directly causes
//! duplicate-or-missing grants. Mutations write the whole document back only
//! when the outcome is `Applied`.

use std::sync::Arc;

use crate::accounts::AccountSource;
use crate::errors::ReconcileError;
use crate::rbac::types::{ClassifiedSubject, GrantOutcome, PolicyDocument, RevokeOutcome};
use crate::rbac::{codec, mutate, resolver};
use crate::store::PolicyStore;

pub struct Reconciler {
    store: Arc<dyn PolicyStore>,
    accounts: Arc<dyn AccountSource>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn PolicyStore>, accounts: Arc<dyn AccountSource>) -> Self {
        Self { store, accounts }
    }

    async fn snapshot(&self) -> Result<PolicyDocument, ReconcileError> {
        let raw = self.store.load().await?;
        Ok(codec::parse(&raw)?)
    }

    /// All known role names: bound roles, permission-holding roles and the
    /// default role.
    pub async fn list_roles(&self) -> Result<Vec<String>, ReconcileError> {
        Ok(self.snapshot().await?.role_names())
    }

    /// Subjects effectively holding `role`, classified against the current
    /// account list.
    pub async fn resolve_role_members(
        &self,
        role: &str,
    ) -> Result<Vec<ClassifiedSubject>, ReconcileError> {
        let doc = self.snapshot().await?;
        let accounts = self.accounts.list_accounts().await?;
        Ok(resolver::subjects_for_role(&doc, role, &accounts))
    }

    /// Roles effectively held by `subject`.
    pub async fn resolve_subject_roles(
        &self,
        subject: &str,
    ) -> Result<Vec<String>, ReconcileError> {
        let doc = self.snapshot().await?;
        Ok(resolver::roles_for_subject(&doc, subject))
    }

    /// Idempotently grant `role` to `subject`.
    pub async fn grant_role(
        &self,
        subject: &str,
        role: &str,
    ) -> Result<GrantOutcome, ReconcileError> {
        let doc = self.snapshot().await?;
        let (updated, outcome) = mutate::grant(&doc, subject, role);
        match outcome {
            GrantOutcome::Applied => {
                self.store.save(&codec::serialize(&updated)).await?;
                tracing::info!(subject, role, store = self.store.store_name(), "granted role");
            }
            GrantOutcome::AlreadyExists => {
                tracing::debug!(subject, role, "grant is a no-op, binding already present");
            }
        }
        Ok(outcome)
    }

    /// Idempotently revoke `role` from `subject`.
    pub async fn revoke_role(
        &self,
        subject: &str,
        role: &str,
    ) -> Result<RevokeOutcome, ReconcileError> {
        let doc = self.snapshot().await?;
        let (updated, outcome) = mutate::revoke(&doc, subject, role);
        match outcome {
            RevokeOutcome::Applied => {
                self.store.save(&codec::serialize(&updated)).await?;
                tracing::info!(subject, role, store = self.store.store_name(), "revoked role");
            }
            RevokeOutcome::AlreadyRevoked => {
                tracing::debug!(subject, role, "revoke is a no-op, no explicit binding to remove");
            }
        }
        Ok(outcome)
    }
}
