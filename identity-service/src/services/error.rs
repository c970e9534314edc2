use service_core::error::AppError;
use thiserror::Error;

use crate::services::registry::RegistryError;
use crate::services::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("{0}")]
    WeakPassword(String),

    // Unknown email and wrong password collapse into one message so the
    // endpoint cannot be used to enumerate accounts.
    #[error("Email or password is incorrect")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Company already registered")]
    CompanyAlreadyRegistered,

    #[error("User not found")]
    UserNotFound,

    #[error("Company not found")]
    CompanyNotFound,

    #[error("Not an admin of this company")]
    NotCompanyAdmin,

    #[error("Invite token not found")]
    InviteNotFound,

    #[error("Invite token already used")]
    InviteAlreadyUsed,

    #[error("Invite token expired")]
    InviteExpired,

    #[error("Invite token revoked")]
    InviteRevoked,

    #[error("Invalid invite token: {0}")]
    InvalidInviteToken(String),

    #[error("expires_in_days must be positive")]
    InvalidInviteExpiry,

    #[error("Company validation failed: {0}")]
    CompanyValidation(#[source] RegistryError),

    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    #[error("Invalid or expired session token")]
    InvalidSessionToken,

    #[error("Federated identity token rejected")]
    FederatedTokenInvalid,

    #[error("Federated identity email is not verified")]
    FederatedEmailUnverified,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::MissingCredentials
            | ServiceError::MissingField(_)
            | ServiceError::InvalidEmail
            | ServiceError::InvalidInviteExpiry => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::WeakPassword(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Email or password is incorrect"))
            }
            ServiceError::AccountDisabled => {
                AppError::Forbidden(anyhow::anyhow!("Account is disabled"))
            }
            ServiceError::EmailAlreadyRegistered | ServiceError::CompanyAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::UserNotFound | ServiceError::CompanyNotFound => {
                AppError::NotFound(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::NotCompanyAdmin => {
                AppError::Forbidden(anyhow::anyhow!("Not an admin of this company"))
            }
            ServiceError::InviteNotFound
            | ServiceError::InviteAlreadyUsed
            | ServiceError::InviteExpired
            | ServiceError::InviteRevoked
            | ServiceError::InvalidInviteToken(_) => {
                AppError::TokenInvalid(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::CompanyValidation(reason) => match reason {
                RegistryError::CompanyTooYoung { .. } => {
                    AppError::BusinessRule(anyhow::anyhow!(format!(
                        "Company validation failed: {}",
                        reason
                    )))
                }
                RegistryError::CompanyNotFound => AppError::NotFound(anyhow::anyhow!(format!(
                    "Company validation failed: {}",
                    reason
                ))),
                RegistryError::InvalidCompanyId | RegistryError::InvalidPostalCode => {
                    AppError::BadRequest(anyhow::anyhow!(format!(
                        "Company validation failed: {}",
                        reason
                    )))
                }
                RegistryError::PostalCodeNotFound => AppError::NotFound(anyhow::anyhow!(format!(
                    "Company validation failed: {}",
                    reason
                ))),
                RegistryError::Unavailable(_) => {
                    AppError::ExternalService(format!("Company validation failed: {}", reason))
                }
            },
            ServiceError::WrongCurrentPassword => {
                AppError::AuthError(anyhow::anyhow!("Current password is incorrect"))
            }
            ServiceError::InvalidSessionToken => {
                AppError::TokenInvalid(anyhow::anyhow!("Invalid or expired session token"))
            }
            ServiceError::FederatedTokenInvalid => {
                AppError::AuthError(anyhow::anyhow!("Federated identity token rejected"))
            }
            ServiceError::FederatedEmailUnverified => AppError::AuthError(anyhow::anyhow!(
                "Federated identity email is not verified"
            )),
            ServiceError::Store(e) => match e {
                StoreError::Duplicate(index) => {
                    AppError::Conflict(anyhow::anyhow!(format!("Duplicate {}", index)))
                }
                StoreError::NotFound => AppError::NotFound(anyhow::anyhow!("Record not found")),
                StoreError::InviteUnavailable(status) => AppError::TokenInvalid(anyhow::anyhow!(
                    format!("Invite token is {}", status.as_str())
                )),
            },
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
