//! User model - platform accounts for company owners and employees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Company,
    Employee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Company => "COMPANY",
            UserRole::Employee => "EMPLOYEE",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "COMPANY" => Ok(UserRole::Company),
            "EMPLOYEE" => Ok(UserRole::Employee),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// User entity.
///
/// `password_hash` is `None` for accounts created through federated login
/// that never set a local password. An `Employee` role always carries a
/// company reference once onboarding completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub company_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub active: bool,
    pub is_admin: bool,
    pub google_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create the owner account minted during company registration.
    pub fn new_company_owner(email: String, password_hash: String, company_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4(),
            email,
            password_hash: Some(password_hash),
            role: UserRole::Company,
            company_id: Some(company_id),
            employee_id: None,
            active: true,
            is_admin: true,
            google_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an employee account during invite-token onboarding.
    pub fn new_employee(
        email: String,
        password_hash: String,
        company_id: Uuid,
        employee_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4(),
            email,
            password_hash: Some(password_hash),
            role: UserRole::Employee,
            company_id: Some(company_id),
            employee_id: Some(employee_id),
            active: true,
            is_admin: false,
            google_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an account from a verified federated identity.
    ///
    /// No local password, defaults to the employee role with no company.
    pub fn new_federated(email: String, google_id: String) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4(),
            email,
            password_hash: None,
            role: UserRole::Employee,
            company_id: None,
            employee_id: None,
            active: true,
            is_admin: false,
            google_id: Some(google_id),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Convert to sanitized response (no credential material).
    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// User response for API (without sensitive fields).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub company_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            email: u.email,
            role: u.role,
            company_id: u.company_id,
            employee_id: u.employee_id,
            active: u.active,
            is_admin: u.is_admin,
            created_at: u.created_at,
        }
    }
}
