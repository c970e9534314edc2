//! Invite token model - single-use, time-limited onboarding credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal and non-terminal token states.
///
/// `Pending` is the only state a token can leave. Expiry is detected
/// lazily; there is no background transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteTokenStatus {
    Pending,
    Used,
    Expired,
    Revoked,
}

impl InviteTokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteTokenStatus::Pending => "pending",
            InviteTokenStatus::Used => "used",
            InviteTokenStatus::Expired => "expired",
            InviteTokenStatus::Revoked => "revoked",
        }
    }
}

/// Invite token entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteToken {
    /// Raw token value, 32 random bytes hex-encoded. Unique.
    pub token: String,
    pub company_id: Uuid,
    pub issued_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<Uuid>,
    pub used_by_email: Option<String>,
    pub active: bool,
}

impl InviteToken {
    pub fn new(
        token: String,
        company_id: Uuid,
        issued_by: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            company_id,
            issued_by,
            created_at: Utc::now(),
            expires_at,
            used_at: None,
            used_by: None,
            used_by_email: None,
            active: true,
        }
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_revoked(&self) -> bool {
        !self.active
    }

    /// Current status. Check order matters: used wins over expired,
    /// expired wins over revoked.
    pub fn status_at(&self, now: DateTime<Utc>) -> InviteTokenStatus {
        if self.is_used() {
            InviteTokenStatus::Used
        } else if self.is_expired_at(now) {
            InviteTokenStatus::Expired
        } else if self.is_revoked() {
            InviteTokenStatus::Revoked
        } else {
            InviteTokenStatus::Pending
        }
    }

    /// Token value redacted for listings: 8-char prefix plus ellipsis.
    pub fn redacted(&self) -> String {
        let prefix: String = self.token.chars().take(8).collect();
        format!("{}…", prefix)
    }
}
