pub mod auth;
pub mod invites;
pub mod user;

pub use auth::{google_login, login, register_company, register_employee, verify_token};
pub use invites::{issue_invite, list_invites, revoke_invite};
pub use user::{change_password, get_profile, update_profile};
