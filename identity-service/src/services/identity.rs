//! Identity orchestration: login, company and employee registration,
//! profiles, password changes, and invite administration.
//!
//! The service holds no state of its own; every collaborator comes in
//! through the constructor so tests can substitute fakes.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::dtos::auth::{
    AuthResponse, CompanyResponse, EmployeeResponse, ProfileResponse, RegisterCompanyRequest,
    RegisterEmployeeRequest, UpdateProfileRequest,
};
use crate::models::{AdminGrant, Company, Employee, User, UserRole};
use crate::services::federated::FederatedIdentityProvider;
use crate::services::invite::{InviteTokenService, InviteTokenSummary, IssuedInvite};
use crate::services::notifier::{DomainEvent, EventNotifier};
use crate::services::registry::CompanyRegistry;
use crate::services::store::{IdentityStore, StoreError};
use crate::services::{JwtService, ServiceError, SessionClaims};
use crate::utils::{
    hash_password, strip_non_digits, validate_email, validate_password, verify_password, Password,
    PasswordHashString,
};

/// Best-effort mirror of profile changes into an external profile store.
/// Failures are logged and swallowed, never surfaced to the caller.
#[async_trait]
pub trait ProfileMirror: Send + Sync {
    async fn mirror_profile(&self, user: &User) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn IdentityStore>,
    registry: Arc<dyn CompanyRegistry>,
    federated: Arc<dyn FederatedIdentityProvider>,
    invites: InviteTokenService,
    jwt: JwtService,
    notifier: Arc<dyn EventNotifier>,
    profile_mirror: Option<Arc<dyn ProfileMirror>>,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        registry: Arc<dyn CompanyRegistry>,
        federated: Arc<dyn FederatedIdentityProvider>,
        invites: InviteTokenService,
        jwt: JwtService,
        notifier: Arc<dyn EventNotifier>,
    ) -> Self {
        Self {
            store,
            registry,
            federated,
            invites,
            jwt,
            notifier,
            profile_mirror: None,
        }
    }

    pub fn with_profile_mirror(mut self, mirror: Arc<dyn ProfileMirror>) -> Self {
        self.profile_mirror = Some(mirror);
        self
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ServiceError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::MissingCredentials);
        }
        if !validate_email(email.trim()) {
            return Err(ServiceError::InvalidEmail);
        }

        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let stored_hash = user
            .password_hash
            .clone()
            .ok_or(ServiceError::InvalidCredentials)?;

        verify_password(
            &Password::new(password.to_string()),
            &PasswordHashString::new(stored_hash),
        )
        .map_err(|_| ServiceError::InvalidCredentials)?;

        if !user.is_active() {
            return Err(ServiceError::AccountDisabled);
        }

        tracing::info!(user_id = %user.user_id, "User logged in");
        self.build_auth_response(user).await
    }

    pub async fn login_with_google(&self, id_token: &str) -> Result<AuthResponse, ServiceError> {
        if id_token.trim().is_empty() {
            return Err(ServiceError::MissingField("id_token"));
        }

        let identity = self.federated.introspect(id_token).await?;
        if !identity.email_verified {
            return Err(ServiceError::FederatedEmailUnverified);
        }

        let user = match self.store.find_user_by_email(&identity.email).await? {
            Some(mut existing) => {
                if !existing.is_active() {
                    return Err(ServiceError::AccountDisabled);
                }
                if existing.google_id.is_none() {
                    existing.google_id = Some(identity.subject.clone());
                    existing.updated_at = chrono::Utc::now();
                    self.store.update_user(&existing).await?;
                }
                existing
            }
            None => {
                let new_user = User::new_federated(identity.email.clone(), identity.subject);
                match self.store.insert_user(&new_user).await {
                    Ok(()) => new_user,
                    // Lost a creation race; the account now exists.
                    Err(StoreError::Duplicate(_)) => self
                        .store
                        .find_user_by_email(&identity.email)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::Internal(anyhow::anyhow!(
                                "user vanished after duplicate insert"
                            ))
                        })?,
                    Err(e) => return Err(e.into()),
                }
            }
        };

        tracing::info!(user_id = %user.user_id, "User logged in via federated identity");
        self.build_auth_response(user).await
    }

    pub async fn register_company(
        &self,
        req: RegisterCompanyRequest,
    ) -> Result<AuthResponse, ServiceError> {
        if req.name.trim().is_empty() {
            return Err(ServiceError::MissingField("name"));
        }
        if req.email.trim().is_empty() {
            return Err(ServiceError::MissingField("email"));
        }
        if req.password.is_empty() {
            return Err(ServiceError::MissingField("password"));
        }
        if req.cnpj.trim().is_empty() {
            return Err(ServiceError::MissingField("cnpj"));
        }

        if !validate_email(req.email.trim()) {
            return Err(ServiceError::InvalidEmail);
        }
        let password_check = validate_password(&req.password);
        if !password_check.is_valid {
            return Err(ServiceError::WeakPassword(password_check.message));
        }

        // Cheap local checks before any external call.
        let cnpj_digits = strip_non_digits(&req.cnpj);
        if self
            .store
            .find_user_by_email(&req.email)
            .await?
            .is_some()
        {
            return Err(ServiceError::EmailAlreadyRegistered);
        }
        if self
            .store
            .find_company_by_cnpj(&cnpj_digits)
            .await?
            .is_some()
        {
            return Err(ServiceError::CompanyAlreadyRegistered);
        }

        // The registry client owns the minimum-age rule; its success
        // means the company is real and old enough.
        let record = self
            .registry
            .lookup_company(&cnpj_digits)
            .await
            .map_err(ServiceError::CompanyValidation)?;

        // Guard against formatting mismatches between the input and the
        // registry-normalized number.
        if record.cnpj != cnpj_digits
            && self
                .store
                .find_company_by_cnpj(&record.cnpj)
                .await?
                .is_some()
        {
            return Err(ServiceError::CompanyAlreadyRegistered);
        }

        let mut company = Company::new(
            req.name.trim().to_string(),
            record.legal_name.clone(),
            record.cnpj.clone(),
            record.founded_at,
        );
        company.street = record.street.clone();
        company.number = record.number.clone();
        company.neighborhood = record.neighborhood.clone();
        company.city = record.city.clone();
        company.state = record.state.clone();
        company.zip = record.zip.clone();
        company.phone = req.phone.clone();
        company.status = record.status.clone();

        // Optional address enrichment; a failed lookup never fails the
        // registration.
        if let Some(cep) = req.cep.as_deref().filter(|c| !c.trim().is_empty()) {
            match self.registry.lookup_postal_code(cep).await {
                Ok(address) => {
                    company.street = address.street.or(company.street);
                    company.neighborhood = address.neighborhood.or(company.neighborhood);
                    company.city = address.city.or(company.city);
                    company.state = address.state.or(company.state);
                    company.zip = Some(address.zip);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Postal code enrichment failed, continuing");
                }
            }
        }

        let password_hash = hash_password(&Password::new(req.password.clone()))
            .map_err(ServiceError::Internal)?;

        let owner = User::new_company_owner(
            req.email.trim().to_string(),
            password_hash.into_string(),
            company.company_id,
        );
        let grant = AdminGrant::new(owner.user_id, company.company_id);

        self.store
            .create_company_with_owner(&company, &owner, &grant)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate("email") => ServiceError::EmailAlreadyRegistered,
                StoreError::Duplicate("cnpj") => ServiceError::CompanyAlreadyRegistered,
                other => ServiceError::Store(other),
            })?;

        tracing::info!(
            company_id = %company.company_id,
            user_id = %owner.user_id,
            "Company registered"
        );
        self.notifier
            .publish(DomainEvent::CompanyRegistered {
                company_id: company.company_id,
                user_id: owner.user_id,
                name: company.name.clone(),
            })
            .await;

        self.build_auth_response(owner).await
    }

    pub async fn register_employee(
        &self,
        req: RegisterEmployeeRequest,
    ) -> Result<AuthResponse, ServiceError> {
        if req.name.trim().is_empty() {
            return Err(ServiceError::MissingField("name"));
        }
        if req.email.trim().is_empty() {
            return Err(ServiceError::MissingField("email"));
        }
        if req.password.is_empty() {
            return Err(ServiceError::MissingField("password"));
        }
        if req.invite_token.trim().is_empty() {
            return Err(ServiceError::MissingField("invite_token"));
        }

        if !validate_email(req.email.trim()) {
            return Err(ServiceError::InvalidEmail);
        }
        let password_check = validate_password(&req.password);
        if !password_check.is_valid {
            return Err(ServiceError::WeakPassword(password_check.message));
        }

        // Read-only token check resolves the owning company and rejects
        // stale tokens before anything is written.
        let company_id = self
            .invites
            .validate(&req.invite_token)
            .await
            .map_err(wrap_invite_error)?;

        if self
            .store
            .find_user_by_email(&req.email)
            .await?
            .is_some()
        {
            return Err(ServiceError::EmailAlreadyRegistered);
        }
        let company = self
            .store
            .find_company_by_id(company_id)
            .await?
            .ok_or(ServiceError::CompanyNotFound)?;

        let password_hash = hash_password(&Password::new(req.password.clone()))
            .map_err(ServiceError::Internal)?;

        let mut employee = Employee::new(
            req.name.trim().to_string(),
            req.email.trim().to_string(),
            company_id,
            req.invite_token.clone(),
        );
        employee.phone = req.phone.clone();
        employee.position = req.position.clone();

        let user = User::new_employee(
            req.email.trim().to_string(),
            password_hash.into_string(),
            company_id,
            employee.employee_id,
        );

        // Consume before creating records so a spent token can never
        // coexist with a half-created account on the failure path.
        self.invites
            .consume(&req.invite_token, user.user_id, &user.email)
            .await
            .map_err(wrap_invite_error)?;

        if let Err(e) = self.store.insert_user(&user).await {
            // The token is already spent; surface the conflict loudly.
            tracing::error!(error = %e, token = %employee.invite_token, "User creation failed after invite consumption");
            return Err(match e {
                StoreError::Duplicate("email") => ServiceError::EmailAlreadyRegistered,
                other => ServiceError::Store(other),
            });
        }
        self.store.insert_employee(&employee).await?;

        tracing::info!(
            employee_id = %employee.employee_id,
            company_id = %company.company_id,
            "Employee registered"
        );
        self.notifier
            .publish(DomainEvent::EmployeeRegistered {
                company_id: company.company_id,
                employee_id: employee.employee_id,
                user_id: user.user_id,
            })
            .await;

        self.build_auth_response(user).await
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<ProfileResponse, ServiceError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let (company, employee) = self.load_affiliations(&user).await?;
        Ok(ProfileResponse {
            user: user.sanitized(),
            company,
            employee,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        updates: UpdateProfileRequest,
    ) -> Result<ProfileResponse, ServiceError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let now = chrono::Utc::now();
        match user.role {
            UserRole::Company => {
                let company_id = user.company_id.ok_or(ServiceError::CompanyNotFound)?;
                let mut company = self
                    .store
                    .find_company_by_id(company_id)
                    .await?
                    .ok_or(ServiceError::CompanyNotFound)?;

                if let Some(name) = updates.name.filter(|n| !n.trim().is_empty()) {
                    company.name = name.trim().to_string();
                }
                if let Some(phone) = updates.phone {
                    company.phone = Some(phone);
                }
                company.updated_at = now;
                self.store.update_company(&company).await?;
            }
            UserRole::Employee => {
                let employee_id = user.employee_id.ok_or(ServiceError::UserNotFound)?;
                let mut employee = self
                    .store
                    .find_employee_by_id(employee_id)
                    .await?
                    .ok_or(ServiceError::UserNotFound)?;

                if let Some(name) = updates.name.filter(|n| !n.trim().is_empty()) {
                    employee.name = name.trim().to_string();
                }
                if let Some(phone) = updates.phone {
                    employee.phone = Some(phone);
                }
                if let Some(position) = updates.position {
                    employee.position = Some(position);
                }
                employee.updated_at = now;
                self.store.update_employee(&employee).await?;
            }
        }

        let mut user = user;
        user.updated_at = now;
        self.store.update_user(&user).await?;

        if let Some(mirror) = &self.profile_mirror {
            if let Err(e) = mirror.mirror_profile(&user).await {
                tracing::warn!(error = %e, user_id = %user.user_id, "Profile mirror failed, continuing");
            }
        }

        self.get_profile(user_id).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let stored_hash = user
            .password_hash
            .clone()
            .ok_or(ServiceError::WrongCurrentPassword)?;
        verify_password(
            &Password::new(current_password.to_string()),
            &PasswordHashString::new(stored_hash),
        )
        .map_err(|_| ServiceError::WrongCurrentPassword)?;

        let password_check = validate_password(new_password);
        if !password_check.is_valid {
            return Err(ServiceError::WeakPassword(password_check.message));
        }

        let new_hash = hash_password(&Password::new(new_password.to_string()))
            .map_err(ServiceError::Internal)?;
        user.password_hash = Some(new_hash.into_string());
        user.updated_at = chrono::Utc::now();
        self.store.update_user(&user).await?;

        tracing::info!(user_id = %user.user_id, "Password changed");
        Ok(())
    }

    /// Mint an invite token. Caller must hold an admin grant for the
    /// company.
    pub async fn generate_invite_token(
        &self,
        company_id: Uuid,
        admin_user_id: Uuid,
        expires_in_days: Option<i64>,
    ) -> Result<IssuedInvite, ServiceError> {
        self.require_company_admin(admin_user_id, company_id).await?;
        self.invites
            .issue(company_id, admin_user_id, expires_in_days)
            .await
    }

    pub async fn list_invite_tokens(
        &self,
        company_id: Uuid,
        admin_user_id: Uuid,
        include_used: bool,
        include_expired: bool,
    ) -> Result<Vec<InviteTokenSummary>, ServiceError> {
        self.require_company_admin(admin_user_id, company_id).await?;
        self.invites
            .list_for_company(company_id, include_used, include_expired)
            .await
    }

    pub async fn revoke_invite_token(
        &self,
        company_id: Uuid,
        admin_user_id: Uuid,
        token: &str,
    ) -> Result<(), ServiceError> {
        self.require_company_admin(admin_user_id, company_id).await?;

        // A token can only be revoked by an admin of its own company.
        let record = self
            .store
            .find_invite_token(token)
            .await?
            .ok_or(ServiceError::InviteNotFound)?;
        if record.company_id != company_id {
            return Err(ServiceError::NotCompanyAdmin);
        }

        self.invites.revoke(token).await
    }

    /// Remove unused invite tokens past expiry across all companies.
    pub async fn cleanup_expired_invites(&self) -> Result<usize, ServiceError> {
        self.invites.cleanup_expired().await
    }

    /// Decode and validate a session token.
    pub fn verify_token(&self, token: &str) -> Result<SessionClaims, ServiceError> {
        self.jwt
            .verify_session_token(token)
            .map_err(|_| ServiceError::InvalidSessionToken)
    }

    async fn require_company_admin(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<(), ServiceError> {
        if self.store.is_company_admin(user_id, company_id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotCompanyAdmin)
        }
    }

    async fn load_affiliations(
        &self,
        user: &User,
    ) -> Result<(Option<CompanyResponse>, Option<EmployeeResponse>), ServiceError> {
        let company = match user.company_id {
            Some(id) => self
                .store
                .find_company_by_id(id)
                .await?
                .map(CompanyResponse::from),
            None => None,
        };
        let employee = match user.employee_id {
            Some(id) => self
                .store
                .find_employee_by_id(id)
                .await?
                .map(EmployeeResponse::from),
            None => None,
        };
        Ok((company, employee))
    }

    async fn build_auth_response(&self, user: User) -> Result<AuthResponse, ServiceError> {
        let token = self
            .jwt
            .generate_session_token(&user)
            .map_err(ServiceError::Internal)?;
        let (company, employee) = self.load_affiliations(&user).await?;

        Ok(AuthResponse {
            user: user.sanitized(),
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.session_expiry_seconds(),
            company,
            employee,
        })
    }
}

fn wrap_invite_error(err: ServiceError) -> ServiceError {
    match err {
        e @ (ServiceError::InviteNotFound
        | ServiceError::InviteAlreadyUsed
        | ServiceError::InviteExpired
        | ServiceError::InviteRevoked) => ServiceError::InvalidInviteToken(e.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::models::UserRole;
    use crate::services::federated::{FederatedIdentity, MockIdentityProvider};
    use crate::services::notifier::RecordingNotifier;
    use crate::services::registry::{CompanyRecord, MockRegistry, RegistryError};
    use crate::services::store::InMemoryStore;
    use chrono::{NaiveDate, Utc};

    const VALID_CNPJ: &str = "11222333000181";

    struct Fixture {
        service: IdentityService,
        registry: Arc<MockRegistry>,
        federated: Arc<MockIdentityProvider>,
        notifier: Arc<RecordingNotifier>,
        store: Arc<InMemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let registry = Arc::new(MockRegistry::new());
        let federated = Arc::new(MockIdentityProvider::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let jwt = JwtService::new(&JwtConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
            session_expiry_hours: 24,
        })
        .unwrap();
        let invites = InviteTokenService::new(store.clone(), notifier.clone(), 30);
        let service = IdentityService::new(
            store.clone(),
            registry.clone(),
            federated.clone(),
            invites,
            jwt,
            notifier.clone(),
        );
        Fixture {
            service,
            registry,
            federated,
            notifier,
            store,
        }
    }

    fn seed_company_record(registry: &MockRegistry) {
        registry.add_company(CompanyRecord {
            cnpj: VALID_CNPJ.to_string(),
            name: "Acme Transportes".to_string(),
            legal_name: "Acme Transportes Ltda".to_string(),
            street: Some("Rua das Flores".to_string()),
            number: Some("100".to_string()),
            neighborhood: None,
            city: Some("São Paulo".to_string()),
            state: Some("SP".to_string()),
            zip: Some("01310100".to_string()),
            founded_at: NaiveDate::from_ymd_opt(2015, 3, 10).unwrap(),
            status: "ATIVA".to_string(),
            activity: None,
            raw: serde_json::json!({}),
        });
    }

    fn company_request(email: &str, cnpj: &str) -> RegisterCompanyRequest {
        RegisterCompanyRequest {
            name: "Acme".to_string(),
            email: email.to_string(),
            password: "Str0ng!Pass".to_string(),
            cnpj: cnpj.to_string(),
            cep: None,
            phone: None,
        }
    }

    async fn register_acme(f: &Fixture) -> AuthResponse {
        seed_company_record(&f.registry);
        f.service
            .register_company(company_request("owner@acme.com", VALID_CNPJ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn company_registration_mints_owner_session() {
        let f = fixture();
        let res = register_acme(&f).await;

        assert!(!res.token.is_empty());
        assert_eq!(res.user.role, UserRole::Company);
        assert!(res.user.is_admin);
        let company = res.company.expect("company attached");
        assert_eq!(company.cnpj, "11.222.333/0001-81");
        assert_eq!(company.legal_name, "Acme Transportes Ltda");

        let events = f.notifier.events();
        assert!(events
            .iter()
            .any(|e| matches!(e, DomainEvent::CompanyRegistered { .. })));
    }

    #[tokio::test]
    async fn duplicate_cnpj_conflicts_without_second_lookup() {
        let f = fixture();
        register_acme(&f).await;
        assert_eq!(f.registry.company_lookup_count(), 1);

        // Same number, different formatting.
        let err = f
            .service
            .register_company(company_request("other@acme.com", "11.222.333/0001-81"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::CompanyAlreadyRegistered));
        assert_eq!(f.registry.company_lookup_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let f = fixture();
        register_acme(&f).await;

        let err = f
            .service
            .register_company(company_request("owner@acme.com", VALID_CNPJ))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::EmailAlreadyRegistered));
    }

    #[tokio::test]
    async fn young_company_is_rejected() {
        let f = fixture();
        f.registry.add_company(CompanyRecord {
            cnpj: VALID_CNPJ.to_string(),
            name: "Acme".to_string(),
            legal_name: "Acme Ltda".to_string(),
            street: None,
            number: None,
            neighborhood: None,
            city: None,
            state: None,
            zip: None,
            founded_at: Utc::now().date_naive() - chrono::Duration::days(30),
            status: "ATIVA".to_string(),
            activity: None,
            raw: serde_json::json!({}),
        });

        let err = f
            .service
            .register_company(company_request("owner@acme.com", VALID_CNPJ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::CompanyValidation(RegistryError::CompanyTooYoung { .. })
        ));
    }

    #[tokio::test]
    async fn employee_joins_through_invite_exactly_once() {
        let f = fixture();
        let owner = register_acme(&f).await;
        let company_id = owner.company.as_ref().unwrap().company_id;
        let owner_id = owner.user.user_id;

        let invite = f
            .service
            .generate_invite_token(company_id, owner_id, None)
            .await
            .unwrap();

        let req = RegisterEmployeeRequest {
            name: "Maria Silva".to_string(),
            email: "maria@acme.com".to_string(),
            password: "Str0ng!Pass".to_string(),
            invite_token: invite.token.clone(),
            phone: None,
            position: Some("Dispatcher".to_string()),
        };
        let res = f.service.register_employee(req).await.unwrap();
        assert_eq!(res.user.role, UserRole::Employee);
        assert_eq!(res.employee.as_ref().unwrap().company_id, company_id);

        // The spent token rejects a second registration.
        let req = RegisterEmployeeRequest {
            name: "João Souza".to_string(),
            email: "joao@acme.com".to_string(),
            password: "Str0ng!Pass".to_string(),
            invite_token: invite.token,
            phone: None,
            position: None,
        };
        let err = f.service.register_employee(req).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInviteToken(_)));
    }

    #[tokio::test]
    async fn login_collapses_unknown_email_and_wrong_password() {
        let f = fixture();
        register_acme(&f).await;

        let err = f
            .service
            .login("nobody@acme.com", "whatever1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));

        let err = f
            .service
            .login("owner@acme.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));

        let res = f.service.login("owner@acme.com", "Str0ng!Pass").await.unwrap();
        assert_eq!(res.user.email, "owner@acme.com");
    }

    #[tokio::test]
    async fn login_rejects_blank_credentials() {
        let f = fixture();
        let err = f.service.login("", "").await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingCredentials));
    }

    #[tokio::test]
    async fn disabled_account_cannot_login() {
        let f = fixture();
        let owner = register_acme(&f).await;

        let mut user = f
            .store
            .find_user_by_id(owner.user.user_id)
            .await
            .unwrap()
            .unwrap();
        user.active = false;
        f.store.update_user(&user).await.unwrap();

        let err = f
            .service
            .login("owner@acme.com", "Str0ng!Pass")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AccountDisabled));
    }

    #[tokio::test]
    async fn change_password_verifies_current() {
        let f = fixture();
        let owner = register_acme(&f).await;
        let user_id = owner.user.user_id;

        let err = f
            .service
            .change_password(user_id, "wrong", "NewStr0ng!Pass")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::WrongCurrentPassword));

        f.service
            .change_password(user_id, "Str0ng!Pass", "NewStr0ng!Pass")
            .await
            .unwrap();

        assert!(f.service.login("owner@acme.com", "Str0ng!Pass").await.is_err());
        assert!(f
            .service
            .login("owner@acme.com", "NewStr0ng!Pass")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn invite_administration_requires_grant() {
        let f = fixture();
        let owner = register_acme(&f).await;
        let company_id = owner.company.as_ref().unwrap().company_id;

        let err = f
            .service
            .generate_invite_token(company_id, Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotCompanyAdmin));

        let err = f
            .service
            .list_invite_tokens(company_id, Uuid::new_v4(), false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotCompanyAdmin));
    }

    #[tokio::test]
    async fn revoke_rejects_foreign_company_token() {
        let f = fixture();
        let owner = register_acme(&f).await;
        let company_id = owner.company.as_ref().unwrap().company_id;
        let owner_id = owner.user.user_id;

        let invite = f
            .service
            .generate_invite_token(company_id, owner_id, None)
            .await
            .unwrap();

        // Grant the owner admin on a second company and try to revoke
        // the first company's token through it.
        let other_company = Uuid::new_v4();
        f.store
            .insert_admin_grant(&AdminGrant::new(owner_id, other_company))
            .await
            .unwrap();

        let err = f
            .service
            .revoke_invite_token(other_company, owner_id, &invite.token)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotCompanyAdmin));

        f.service
            .revoke_invite_token(company_id, owner_id, &invite.token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn google_login_creates_then_reuses_account() {
        let f = fixture();
        f.federated.add_identity(
            "good-token",
            FederatedIdentity {
                subject: "g-12345".to_string(),
                email: "fed@acme.com".to_string(),
                email_verified: true,
                name: Some("Fed User".to_string()),
                picture_url: None,
            },
        );

        let first = f.service.login_with_google("good-token").await.unwrap();
        let second = f.service.login_with_google("good-token").await.unwrap();
        assert_eq!(first.user.user_id, second.user.user_id);

        let err = f.service.login_with_google("bad-token").await.unwrap_err();
        assert!(matches!(err, ServiceError::FederatedTokenInvalid));
    }

    #[tokio::test]
    async fn google_login_requires_verified_email() {
        let f = fixture();
        f.federated.add_identity(
            "unverified",
            FederatedIdentity {
                subject: "g-999".to_string(),
                email: "shady@acme.com".to_string(),
                email_verified: false,
                name: None,
                picture_url: None,
            },
        );

        let err = f.service.login_with_google("unverified").await.unwrap_err();
        assert!(matches!(err, ServiceError::FederatedEmailUnverified));
    }

    #[tokio::test]
    async fn profile_update_touches_role_specific_record() {
        let f = fixture();
        let owner = register_acme(&f).await;

        let res = f
            .service
            .update_profile(
                owner.user.user_id,
                UpdateProfileRequest {
                    name: Some("Acme Renamed".to_string()),
                    phone: Some("+55 11 99999-0000".to_string()),
                    position: None,
                },
            )
            .await
            .unwrap();

        let company = res.company.expect("company attached");
        assert_eq!(company.name, "Acme Renamed");
        assert_eq!(company.phone.as_deref(), Some("+55 11 99999-0000"));
    }

    #[tokio::test]
    async fn verify_token_roundtrip() {
        let f = fixture();
        let owner = register_acme(&f).await;

        let claims = f.service.verify_token(&owner.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), owner.user.user_id);

        let err = f.service.verify_token("not-a-jwt").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidSessionToken));
    }
}
