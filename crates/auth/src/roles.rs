//! Organization roles used for authorization decisions.

use serde::{Deserialize, Serialize};

/// A user's role within an organization, resolved via the external directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Member,
    Admin,
    Owner,
}

impl OrgRole {
    /// Admins and org owners may reimburse approved claims without being
    /// assigned as a manager on them.
    pub fn can_reimburse(&self) -> bool {
        matches!(self, OrgRole::Admin | OrgRole::Owner)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Member => "member",
            OrgRole::Admin => "admin",
            OrgRole::Owner => "owner",
        }
    }
}

impl core::fmt::Display for OrgRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
