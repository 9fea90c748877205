//! Company onboarding: creation, invites, and acceptance.

pub mod notifier;
pub mod service;

pub use notifier::{InviteNotifier, LogNotifier};
pub use service::{AcceptInviteInput, CompanyService, CreateCompanyInput, CreateInviteInput, CreatedCompany, CreatedInvite};
