//! RBAC reconciliation core: document codec, subject classification,
//! role-membership resolution and idempotent grant/revoke mutations.
//!
//! Everything in this module is pure — I/O lives behind the [`crate::store`]
//! and [`crate::accounts`] ports, and the [`crate::service`] layer wires the
//! two together.

pub mod classify;
pub mod codec;
pub mod errors;
pub mod mutate;
pub mod resolver;
pub mod types;
