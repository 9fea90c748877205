//! Company entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A company account. The company is the unit of data isolation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    /// Unique company identifier (the tenant identifier).
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// User who created the company.
    pub owner_id: Uuid,
    /// When the company was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a company.
#[derive(Debug, Clone)]
pub struct CreateCompany {
    /// Display name.
    pub name: String,
    /// Creating user.
    pub owner_id: Uuid,
}
