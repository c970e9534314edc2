//! Pluggable identity store.
//!
//! The trait is the seam between the business services and persistence.
//! The in-memory implementation backs tests and single-node deployments;
//! a database-backed implementation plugs in behind the same trait with
//! unique constraints standing in for the entry-level atomicity here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AdminGrant, Company, Employee, InviteToken, InviteTokenStatus, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique index violation; the payload names the index.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("record not found")]
    NotFound,

    /// Invite token exists but is in a terminal state.
    #[error("invite token is {}", .0.as_str())]
    InviteUnavailable(InviteTokenStatus),
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    // Users. Email uniqueness is enforced atomically with the insert.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;

    // Companies. CNPJ (digits-only) uniqueness is enforced atomically.
    async fn insert_company(&self, company: &Company) -> Result<(), StoreError>;
    async fn find_company_by_id(&self, company_id: Uuid) -> Result<Option<Company>, StoreError>;
    async fn find_company_by_cnpj(&self, cnpj: &str) -> Result<Option<Company>, StoreError>;
    async fn update_company(&self, company: &Company) -> Result<(), StoreError>;

    /// Create a company together with its owner account and admin grant.
    /// Both unique indices (email, cnpj) are checked as part of the
    /// insert; a violation of either leaves no partial records behind.
    async fn create_company_with_owner(
        &self,
        company: &Company,
        owner: &User,
        grant: &AdminGrant,
    ) -> Result<(), StoreError>;

    // Employees.
    async fn insert_employee(&self, employee: &Employee) -> Result<(), StoreError>;
    async fn find_employee_by_id(&self, employee_id: Uuid)
        -> Result<Option<Employee>, StoreError>;
    async fn update_employee(&self, employee: &Employee) -> Result<(), StoreError>;

    // Admin grants.
    async fn insert_admin_grant(&self, grant: &AdminGrant) -> Result<(), StoreError>;
    async fn is_company_admin(&self, user_id: Uuid, company_id: Uuid)
        -> Result<bool, StoreError>;

    // Invite tokens. `consume_invite_token` is the atomic transition:
    // exactly one concurrent caller succeeds for a given token.
    async fn insert_invite_token(&self, token: &InviteToken) -> Result<(), StoreError>;
    async fn find_invite_token(&self, token: &str) -> Result<Option<InviteToken>, StoreError>;
    async fn consume_invite_token(
        &self,
        token: &str,
        used_by: Uuid,
        used_by_email: &str,
        now: DateTime<Utc>,
    ) -> Result<InviteToken, StoreError>;
    async fn revoke_invite_token(&self, token: &str) -> Result<(), StoreError>;
    async fn list_invite_tokens(&self, company_id: Uuid) -> Result<Vec<InviteToken>, StoreError>;
    async fn remove_expired_invite_tokens(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// In-memory store over concurrent maps with explicit unique indices.
#[derive(Default)]
pub struct InMemoryStore {
    users: DashMap<Uuid, User>,
    users_by_email: DashMap<String, Uuid>,
    companies: DashMap<Uuid, Company>,
    companies_by_cnpj: DashMap<String, Uuid>,
    employees: DashMap<Uuid, Employee>,
    admin_grants: DashMap<(Uuid, Uuid), AdminGrant>,
    invite_tokens: DashMap<String, InviteToken>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        // The index entry guards the check-then-insert.
        match self.users_by_email.entry(normalize_email(&user.email)) {
            Entry::Occupied(_) => Err(StoreError::Duplicate("email")),
            Entry::Vacant(slot) => {
                slot.insert(user.user_id);
                self.users.insert(user.user_id, user.clone());
                Ok(())
            }
        }
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user_id = match self.users_by_email.get(&normalize_email(email)) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        match self.users.get_mut(&user.user_id) {
            Some(mut existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn insert_company(&self, company: &Company) -> Result<(), StoreError> {
        match self.companies_by_cnpj.entry(company.cnpj.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate("cnpj")),
            Entry::Vacant(slot) => {
                slot.insert(company.company_id);
                self.companies.insert(company.company_id, company.clone());
                Ok(())
            }
        }
    }

    async fn find_company_by_id(&self, company_id: Uuid) -> Result<Option<Company>, StoreError> {
        Ok(self.companies.get(&company_id).map(|c| c.clone()))
    }

    async fn find_company_by_cnpj(&self, cnpj: &str) -> Result<Option<Company>, StoreError> {
        let company_id = match self.companies_by_cnpj.get(cnpj) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.companies.get(&company_id).map(|c| c.clone()))
    }

    async fn update_company(&self, company: &Company) -> Result<(), StoreError> {
        match self.companies.get_mut(&company.company_id) {
            Some(mut existing) => {
                *existing = company.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn create_company_with_owner(
        &self,
        company: &Company,
        owner: &User,
        grant: &AdminGrant,
    ) -> Result<(), StoreError> {
        // Claim the email index first, then the cnpj index; undo the
        // email claim if the second insert loses a race.
        match self.users_by_email.entry(normalize_email(&owner.email)) {
            Entry::Occupied(_) => return Err(StoreError::Duplicate("email")),
            Entry::Vacant(slot) => {
                slot.insert(owner.user_id);
            }
        }

        match self.companies_by_cnpj.entry(company.cnpj.clone()) {
            Entry::Occupied(_) => {
                self.users_by_email.remove(&normalize_email(&owner.email));
                return Err(StoreError::Duplicate("cnpj"));
            }
            Entry::Vacant(slot) => {
                slot.insert(company.company_id);
            }
        }

        self.users.insert(owner.user_id, owner.clone());
        self.companies.insert(company.company_id, company.clone());
        self.admin_grants
            .insert((grant.user_id, grant.company_id), grant.clone());
        Ok(())
    }

    async fn insert_employee(&self, employee: &Employee) -> Result<(), StoreError> {
        self.employees
            .insert(employee.employee_id, employee.clone());
        Ok(())
    }

    async fn find_employee_by_id(
        &self,
        employee_id: Uuid,
    ) -> Result<Option<Employee>, StoreError> {
        Ok(self.employees.get(&employee_id).map(|e| e.clone()))
    }

    async fn update_employee(&self, employee: &Employee) -> Result<(), StoreError> {
        match self.employees.get_mut(&employee.employee_id) {
            Some(mut existing) => {
                *existing = employee.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn insert_admin_grant(&self, grant: &AdminGrant) -> Result<(), StoreError> {
        self.admin_grants
            .insert((grant.user_id, grant.company_id), grant.clone());
        Ok(())
    }

    async fn is_company_admin(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self.admin_grants.contains_key(&(user_id, company_id)))
    }

    async fn insert_invite_token(&self, token: &InviteToken) -> Result<(), StoreError> {
        match self.invite_tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate("invite_token")),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn find_invite_token(&self, token: &str) -> Result<Option<InviteToken>, StoreError> {
        Ok(self.invite_tokens.get(token).map(|t| t.clone()))
    }

    async fn consume_invite_token(
        &self,
        token: &str,
        used_by: Uuid,
        used_by_email: &str,
        now: DateTime<Utc>,
    ) -> Result<InviteToken, StoreError> {
        let mut entry = self
            .invite_tokens
            .get_mut(token)
            .ok_or(StoreError::NotFound)?;

        // Re-check under the entry lock so only one consumer wins.
        match entry.status_at(now) {
            InviteTokenStatus::Pending => {
                entry.used_at = Some(now);
                entry.used_by = Some(used_by);
                entry.used_by_email = Some(used_by_email.to_string());
                Ok(entry.clone())
            }
            terminal => Err(StoreError::InviteUnavailable(terminal)),
        }
    }

    async fn revoke_invite_token(&self, token: &str) -> Result<(), StoreError> {
        let mut entry = self
            .invite_tokens
            .get_mut(token)
            .ok_or(StoreError::NotFound)?;
        entry.active = false;
        Ok(())
    }

    async fn list_invite_tokens(&self, company_id: Uuid) -> Result<Vec<InviteToken>, StoreError> {
        let mut tokens: Vec<InviteToken> = self
            .invite_tokens
            .iter()
            .filter(|t| t.company_id == company_id)
            .map(|t| t.clone())
            .collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tokens)
    }

    async fn remove_expired_invite_tokens(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let before = self.invite_tokens.len();
        // Used tokens are kept as an audit trail regardless of age.
        self.invite_tokens
            .retain(|_, t| t.is_used() || !t.is_expired_at(now));
        Ok(before.saturating_sub(self.invite_tokens.len()))
    }
}
