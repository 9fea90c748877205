//! # stockdesk-service
//!
//! Business logic for StockDesk. Each service is built once at start-up
//! from `Arc`-shared stores and takes a [`RequestContext`] per call. All
//! tenant-owned data is reached through `TenantRepository`, with the
//! caller's tenant context, after the Permission Evaluator has approved
//! the module/action pair.

pub mod account;
pub mod company;
pub mod context;
pub mod integration;
pub mod inventory;
pub mod role;
pub mod validation;

pub use account::AccountService;
pub use company::{CompanyService, InviteNotifier, LogNotifier};
pub use context::RequestContext;
pub use integration::IntegrationService;
pub use inventory::{ItemService, LedgerService, LocationService};
pub use role::RoleService;
