//! Domain models for the identity service.

mod company;
mod employee;
mod invite_token;
mod user;

pub use company::{AdminGrant, Company};
pub use employee::Employee;
pub use invite_token::{InviteToken, InviteTokenStatus};
pub use user::{User, UserResponse, UserRole};
