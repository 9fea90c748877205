//! HTTP request handlers, one module per resource.

pub mod auth;
pub mod company;
pub mod health;
pub mod integration;
pub mod inventory;
pub mod item;
pub mod location;
pub mod role;
