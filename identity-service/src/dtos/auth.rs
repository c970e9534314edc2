use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Company, Employee, UserResponse};
use crate::utils::format_cnpj;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterCompanyRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(length(min = 1, message = "CNPJ is required"))]
    pub cnpj: String,
    pub cep: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterEmployeeRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(length(min = 1, message = "Invite token is required"))]
    pub invite_token: String,
    pub phone: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: String,
}

/// Introspection result. Claims are present only when the token is
/// valid.
#[derive(Debug, Serialize)]
pub struct TokenStatusResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl TokenStatusResponse {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            user_id: None,
            email: None,
            role: None,
            expires_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct IssueInviteRequest {
    #[validate(range(min = 1, max = 365, message = "Expiry must be between 1 and 365 days"))]
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct InviteListQuery {
    #[serde(default)]
    pub include_used: bool,
    #[serde(default)]
    pub include_expired: bool,
}

/// Company view with the registry number formatted for display.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyResponse {
    pub company_id: Uuid,
    pub name: String,
    pub legal_name: String,
    pub cnpj: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub founded_at: NaiveDate,
    pub status: String,
    pub plan: String,
}

impl From<Company> for CompanyResponse {
    fn from(c: Company) -> Self {
        Self {
            company_id: c.company_id,
            name: c.name,
            legal_name: c.legal_name,
            cnpj: format_cnpj(&c.cnpj),
            city: c.city,
            state: c.state,
            zip: c.zip,
            phone: c.phone,
            founded_at: c.founded_at,
            status: c.status,
            plan: c.plan,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeResponse {
    pub employee_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub company_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Employee> for EmployeeResponse {
    fn from(e: Employee) -> Self {
        Self {
            employee_id: e.employee_id,
            name: e.name,
            email: e.email,
            phone: e.phone,
            position: e.position,
            company_id: e.company_id,
            created_at: e.created_at,
        }
    }
}

/// Session payload returned by login and both registration flows.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<EmployeeResponse>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<EmployeeResponse>,
}
