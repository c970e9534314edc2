//! Company model - registered carrier companies and admin grants.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Company entity.
///
/// `cnpj` is stored digits-only; formatting is applied at the response
/// layer. Uniqueness is enforced on the digits-only value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub company_id: Uuid,
    pub name: String,
    pub legal_name: String,
    pub cnpj: String,
    pub street: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub founded_at: NaiveDate,
    pub status: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: String, legal_name: String, cnpj: String, founded_at: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            company_id: Uuid::new_v4(),
            name,
            legal_name,
            cnpj,
            street: None,
            number: None,
            neighborhood: None,
            city: None,
            state: None,
            zip: None,
            phone: None,
            founded_at,
            status: "ACTIVE".to_string(),
            plan: "FREE".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Company admin grant.
///
/// Holding a grant for a company authorizes minting and listing invite
/// tokens for that company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminGrant {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role: String,
    pub granted_at: DateTime<Utc>,
}

impl AdminGrant {
    pub fn new(user_id: Uuid, company_id: Uuid) -> Self {
        Self {
            user_id,
            company_id,
            role: "ADMIN".to_string(),
            granted_at: Utc::now(),
        }
    }
}
