//! External membership/role directory contract.

use std::sync::Arc;

use claimflow_core::{OrgId, UserId};

use crate::roles::OrgRole;

/// Organization membership and role lookups.
///
/// The directory is an external collaborator (HR system, identity provider,
/// membership table); this core only consumes the two facts it needs.
/// Implementations must be side-effect free from the caller's perspective.
pub trait Directory: Send + Sync {
    /// Whether `user_id` is currently a member of `org_id`.
    fn is_member(&self, org_id: OrgId, user_id: UserId) -> bool;

    /// The user's role in the organization, or `None` when not a member.
    fn role(&self, org_id: OrgId, user_id: UserId) -> Option<OrgRole>;
}

impl<D> Directory for Arc<D>
where
    D: Directory + ?Sized,
{
    fn is_member(&self, org_id: OrgId, user_id: UserId) -> bool {
        (**self).is_member(org_id, user_id)
    }

    fn role(&self, org_id: OrgId, user_id: UserId) -> Option<OrgRole> {
        (**self).role(org_id, user_id)
    }
}
