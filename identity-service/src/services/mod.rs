//! Services layer for identity-service.
//!
//! Business logic for authentication, registration, invite tokens, and
//! external registry validation.

pub mod error;
mod federated;
mod identity;
mod invite;
mod jwt;
mod notifier;
pub mod registry;
pub mod store;

pub use error::ServiceError;
pub use federated::{
    FederatedIdentity, FederatedIdentityProvider, GoogleIdentityProvider, MockIdentityProvider,
};
pub use identity::{IdentityService, ProfileMirror};
pub use invite::{ConsumedInvite, InviteTokenService, InviteTokenSummary, IssuedInvite};
pub use jwt::{JwtService, SessionClaims};
pub use notifier::{DomainEvent, EventNotifier, LoggingNotifier, RecordingNotifier};
pub use registry::{
    AddressRecord, CompanyRecord, CompanyRegistry, HttpRegistryClient, MockRegistry, RegistryError,
};
pub use store::{IdentityStore, InMemoryStore, StoreError};
