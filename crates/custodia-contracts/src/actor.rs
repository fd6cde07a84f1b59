//! Caller identity, roles, and the permissions they carry.
//!
//! Custodia does not authenticate anyone — the hosting application resolves a
//! session to an `Actor` and passes it in. Roles form a closed enumeration
//! mapped to fixed permission sets; every operation checks the one permission
//! it needs at its boundary and nowhere else.

use serde::{Deserialize, Serialize};

/// A single grantable capability.
///
/// The mapping from role to permissions is fixed at compile time — there is
/// no runtime grant or elevation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Register new evidence and its intake hash.
    Upload,
    /// Read evidence, ledger entries, and hash history.
    View,
    /// Initiate and finalize custody transfers.
    Transfer,
    /// Run integrity verification.
    Verify,
    /// Dispose of evidence (exercised by external collaborators only).
    Delete,
    /// Administrative operations, including chain audits.
    Admin,
}

/// The closed set of investigative roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Investigator,
    ForensicAnalyst,
    Prosecutor,
    Judge,
    Auditor,
}

impl Role {
    /// The permissions this role holds.
    pub fn permissions(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Admin => &[Upload, View, Transfer, Verify, Delete, Admin],
            Role::Investigator => &[Upload, View, Transfer, Verify],
            Role::ForensicAnalyst => &[View, Verify],
            Role::Prosecutor => &[View, Verify],
            Role::Judge => &[View, Verify],
            Role::Auditor => &[View, Verify],
        }
    }

    /// Return true if this role holds `permission`.
    pub fn can(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Stable snake_case name used in ledger entries.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Investigator => "investigator",
            Role::ForensicAnalyst => "forensic_analyst",
            Role::Prosecutor => "prosecutor",
            Role::Judge => "judge",
            Role::Auditor => "auditor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated identity behind a mutating operation.
///
/// Recorded verbatim into every ledger entry the operation produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

/// What the external user directory returns for an identity lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl UserRecord {
    /// Project this directory record down to the `Actor` identity that gets
    /// written into ledger entries.
    pub fn as_actor(&self) -> Actor {
        Actor {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}
