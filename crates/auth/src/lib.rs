//! `dealdesk-auth` — authenticated principals and approval authorization.
//!
//! The identity provider (SSO) lives outside this codebase; what arrives here
//! is an already-resolved capability set per user. This crate defines that
//! capability set and the pure policy checks the workflow layer enforces.

pub mod roles;
pub mod user;

pub use roles::Role;
pub use user::{ensure_can_approve, AuthenticatedUser};
