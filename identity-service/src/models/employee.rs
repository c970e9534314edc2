//! Employee model - company staff records created through invite onboarding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Employee entity. Exactly one record exists per employee-role user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub company_id: Uuid,
    /// Invite token consumed to create this record.
    pub invite_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn new(name: String, email: String, company_id: Uuid, invite_token: String) -> Self {
        let now = Utc::now();
        Self {
            employee_id: Uuid::new_v4(),
            name,
            email,
            phone: None,
            position: None,
            company_id,
            invite_token,
            created_at: now,
            updated_at: now,
        }
    }
}
