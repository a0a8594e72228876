//! Permission grants.
//!
//! A grant is a directed edge `(owner, grantee, intent)`: the grantee may
//! address the owner with the intent even though it is privileged. Grants
//! are additive and revocable; the absence of a grant means deny.

use serde::{Deserialize, Serialize};

use intentmail_core::{Fingerprint, IntentName};

/// One recorded grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    /// The identity whose intent is being opened up.
    pub owner: Fingerprint,

    /// Who may now use the intent.
    pub grantee: Fingerprint,

    pub intent: IntentName,
}

impl PermissionGrant {
    pub fn new(owner: Fingerprint, grantee: Fingerprint, intent: IntentName) -> Self {
        Self {
            owner,
            grantee,
            intent,
        }
    }
}
