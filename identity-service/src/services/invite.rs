//! Invite token lifecycle: issue, validate, consume, revoke, list,
//! cleanup.
//!
//! A token moves from `pending` into exactly one terminal state: `used`
//! on consumption, `expired` once past its expiry instant (detected
//! lazily), or `revoked` on explicit deactivation.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{InviteToken, InviteTokenStatus};
use crate::services::notifier::{DomainEvent, EventNotifier};
use crate::services::store::{IdentityStore, StoreError};
use crate::services::ServiceError;

/// Result of issuing a token. The raw value is only ever returned here;
/// listings redact it.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedInvite {
    pub token: String,
    pub company_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsumedInvite {
    pub company_id: Uuid,
    pub used_at: DateTime<Utc>,
    pub used_by_email: String,
}

/// Invite token listing entry with the raw value redacted.
#[derive(Debug, Clone, Serialize)]
pub struct InviteTokenSummary {
    pub token: String,
    pub status: InviteTokenStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_by_email: Option<String>,
}

#[derive(Clone)]
pub struct InviteTokenService {
    store: Arc<dyn IdentityStore>,
    notifier: Arc<dyn EventNotifier>,
    default_expiry_days: i64,
}

fn generate_token_value() -> String {
    let mut rng = rand::thread_rng();
    let token_bytes: [u8; 32] = rng.gen();
    hex::encode(token_bytes)
}

fn status_to_error(status: InviteTokenStatus) -> ServiceError {
    match status {
        InviteTokenStatus::Pending => {
            // Callers only map terminal states; pending is never an error.
            ServiceError::Internal(anyhow::anyhow!("pending token treated as failure"))
        }
        InviteTokenStatus::Used => ServiceError::InviteAlreadyUsed,
        InviteTokenStatus::Expired => ServiceError::InviteExpired,
        InviteTokenStatus::Revoked => ServiceError::InviteRevoked,
    }
}

impl InviteTokenService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        notifier: Arc<dyn EventNotifier>,
        default_expiry_days: i64,
    ) -> Self {
        Self {
            store,
            notifier,
            default_expiry_days,
        }
    }

    /// Issue a fresh token for a company.
    pub async fn issue(
        &self,
        company_id: Uuid,
        issued_by: Uuid,
        expires_in_days: Option<i64>,
    ) -> Result<IssuedInvite, ServiceError> {
        let days = expires_in_days.unwrap_or(self.default_expiry_days);
        if days <= 0 {
            return Err(ServiceError::InvalidInviteExpiry);
        }

        let expires_at = Utc::now() + Duration::days(days);
        let token = InviteToken::new(generate_token_value(), company_id, issued_by, expires_at);

        self.store.insert_invite_token(&token).await?;

        tracing::info!(company_id = %company_id, issued_by = %issued_by, "Invite token issued");
        self.notifier
            .publish(DomainEvent::InviteTokenIssued {
                company_id,
                issued_by,
                expires_at,
            })
            .await;

        Ok(IssuedInvite {
            token: token.token,
            company_id,
            expires_at,
        })
    }

    /// Read-only validation. Check order: existence, used, expired,
    /// revoked; the first failure wins.
    pub async fn validate(&self, token: &str) -> Result<Uuid, ServiceError> {
        let record = self
            .store
            .find_invite_token(token)
            .await?
            .ok_or(ServiceError::InviteNotFound)?;

        match record.status_at(Utc::now()) {
            InviteTokenStatus::Pending => Ok(record.company_id),
            terminal => Err(status_to_error(terminal)),
        }
    }

    /// Consume a token. The store transition is atomic: under concurrent
    /// attempts on the same token exactly one caller succeeds.
    pub async fn consume(
        &self,
        token: &str,
        used_by: Uuid,
        used_by_email: &str,
    ) -> Result<ConsumedInvite, ServiceError> {
        // Validation first keeps failure ordering stable; the store
        // re-checks under its own lock.
        self.validate(token).await?;

        let now = Utc::now();
        let record = self
            .store
            .consume_invite_token(token, used_by, used_by_email, now)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ServiceError::InviteNotFound,
                StoreError::InviteUnavailable(status) => status_to_error(status),
                other => ServiceError::Store(other),
            })?;

        tracing::info!(company_id = %record.company_id, used_by = %used_by, "Invite token consumed");
        self.notifier
            .publish(DomainEvent::InviteTokenConsumed {
                company_id: record.company_id,
                used_by,
                used_by_email: used_by_email.to_string(),
            })
            .await;

        Ok(ConsumedInvite {
            company_id: record.company_id,
            used_at: now,
            used_by_email: used_by_email.to_string(),
        })
    }

    /// Deactivate a token. Idempotent: revoking an already-revoked or
    /// already-used token succeeds without changing its terminal state.
    pub async fn revoke(&self, token: &str) -> Result<(), ServiceError> {
        self.store
            .revoke_invite_token(token)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ServiceError::InviteNotFound,
                other => ServiceError::Store(other),
            })
    }

    /// List a company's tokens with raw values redacted. Used and
    /// expired tokens are excluded unless asked for.
    pub async fn list_for_company(
        &self,
        company_id: Uuid,
        include_used: bool,
        include_expired: bool,
    ) -> Result<Vec<InviteTokenSummary>, ServiceError> {
        let now = Utc::now();
        let tokens = self.store.list_invite_tokens(company_id).await?;

        Ok(tokens
            .into_iter()
            .filter(|t| {
                let status = t.status_at(now);
                match status {
                    InviteTokenStatus::Used => include_used,
                    InviteTokenStatus::Expired => include_expired,
                    _ => true,
                }
            })
            .map(|t| InviteTokenSummary {
                token: t.redacted(),
                status: t.status_at(now),
                created_at: t.created_at,
                expires_at: t.expires_at,
                used_at: t.used_at,
                used_by_email: t.used_by_email.clone(),
            })
            .collect())
    }

    /// Remove unused tokens past expiry. Used tokens stay as an audit
    /// trail.
    pub async fn cleanup_expired(&self) -> Result<usize, ServiceError> {
        let removed = self
            .store
            .remove_expired_invite_tokens(Utc::now())
            .await?;
        if removed > 0 {
            tracing::info!(removed, "Expired invite tokens removed");
        }
        Ok(removed)
    }
}
