//! `claimflow-auth` — pure authorization boundary for expense actions.
//!
//! This crate is intentionally decoupled from transport and storage: the
//! guard is a pure function of the actor, the expense, the requested action,
//! and the facts supplied by the [`Directory`] collaborator.

pub mod directory;
pub mod guard;
pub mod roles;

pub use directory::Directory;
pub use guard::{authorize, AuthzError};
pub use roles::OrgRole;
