//! Syzygy - RBAC policy reconciliation engine
//!
//! Resolves and mutates role-membership bindings in a shared, line-oriented
//! access-control policy document. The pure core lives in [`rbac`]; I/O is
//! confined to the [`store`] and [`accounts`] ports.

pub mod accounts;
pub mod errors;
pub mod rbac;
pub mod service;
pub mod settings;
pub mod store;
pub mod web;
