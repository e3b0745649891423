//! Captain detection for the signed-in identity.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::repos::AdminConfigRepo;

/// Identity forwarded by the upstream identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

impl Identity {
    /// Blank values count as "nobody signed in".
    pub fn from_header_value(value: &str) -> Option<Self> {
        let email = value.trim();
        (!email.is_empty()).then(|| Self {
            email: email.to_string(),
        })
    }
}

/// Resolved access level for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Anonymous,
    Member(Identity),
    Captain(Identity),
}

#[derive(Clone)]
pub struct RoleGuard {
    config: Arc<dyn AdminConfigRepo>,
}

impl RoleGuard {
    pub fn new(config: Arc<dyn AdminConfigRepo>) -> Self {
        Self { config }
    }

    /// Compare the identity with the configured captain email (exact,
    /// case-sensitive). Any failure to read the configuration denies.
    pub async fn resolve(&self, identity: Option<Identity>) -> Access {
        let Some(identity) = identity else {
            return Access::Anonymous;
        };

        let access = match self.config.load_admin_email().await {
            Ok(Some(email)) if email == identity.email => Access::Captain(identity),
            Ok(Some(_)) => Access::Member(identity),
            Ok(None) => {
                warn!(
                    target = "noticeboard::guard",
                    "admin config record is missing; treating everyone as a member"
                );
                Access::Member(identity)
            }
            Err(err) => {
                warn!(
                    target = "noticeboard::guard",
                    error = %err,
                    "failed to load admin config; denying captain access"
                );
                Access::Member(identity)
            }
        };

        debug!(target = "noticeboard::guard", access = ?access, "resolved access");
        access
    }
}
