//! Stock locations.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, json};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use stockdesk_auth::PermissionEvaluator;
use stockdesk_core::error::AppError;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::{Filter, SortField};
use stockdesk_database::query::FindOptions;
use stockdesk_database::{RecordStore, TenantRepository};
use stockdesk_entity::inventory::Location;
use stockdesk_entity::role::{Action, Module};

use crate::context::RequestContext;
use crate::validation::validate_input;

/// Request to create a location.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLocationInput {
    /// Display name.
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"))]
    pub name: String,
    /// Short code, unique per company.
    #[validate(length(min = 1, max = 16, message = "must be 1-16 characters"))]
    pub code: String,
    /// Street address.
    #[validate(length(max = 300))]
    pub address: Option<String>,
}

/// Request to change a location. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLocationInput {
    /// New name.
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"))]
    pub name: Option<String>,
    /// New address.
    #[validate(length(max = 300))]
    pub address: Option<String>,
    /// Open or close the location for stock movements.
    pub is_active: Option<bool>,
}

/// CRUD over the caller's locations.
#[derive(Debug, Clone)]
pub struct LocationService {
    locations: TenantRepository<Location>,
    permissions: PermissionEvaluator,
}

impl LocationService {
    /// Create a new location service.
    pub fn new(records: Arc<dyn RecordStore>, permissions: PermissionEvaluator) -> Self {
        Self {
            locations: TenantRepository::new(records),
            permissions,
        }
    }

    /// All locations, by code.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<Location>> {
        ctx.authorize(&self.permissions, Module::Locations, Action::Read).await?;
        self.locations
            .find(&ctx.tenant(), Filter::new(), &FindOptions::sorted(vec![SortField::asc("code")]))
            .await
    }

    /// One location.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Location> {
        ctx.authorize(&self.permissions, Module::Locations, Action::Read).await?;
        self.locations.get(&ctx.tenant(), id).await
    }

    /// Create a location. Codes are stored upper-cased.
    pub async fn create(&self, ctx: &RequestContext, input: CreateLocationInput) -> AppResult<Location> {
        ctx.authorize(&self.permissions, Module::Locations, Action::Create).await?;
        validate_input(&input)?;
        let tenant = ctx.tenant();
        let code = input.code.trim().to_uppercase();

        if self
            .locations
            .find_one(&tenant, Filter::new().eq("code", code.as_str()))
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!("Location code '{code}' is already in use")));
        }

        let now = Utc::now();
        let location = Location {
            id: Uuid::now_v7(),
            company_id: Uuid::nil(),
            name: input.name.trim().to_string(),
            code,
            address: input.address,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let location = self.locations.create(&tenant, &location).await?;
        info!(location_id = %location.id, code = %location.code, "Location created");
        Ok(location)
    }

    /// Change a location. The code is fixed once created.
    pub async fn update(&self, ctx: &RequestContext, id: Uuid, input: UpdateLocationInput) -> AppResult<Location> {
        ctx.authorize(&self.permissions, Module::Locations, Action::Update).await?;
        validate_input(&input)?;

        let mut patch = Map::new();
        if let Some(name) = input.name {
            patch.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(address) = input.address {
            patch.insert("address".to_string(), json!(address));
        }
        if let Some(active) = input.is_active {
            patch.insert("is_active".to_string(), json!(active));
        }
        patch.insert("updated_at".to_string(), json!(Utc::now()));

        self.locations
            .update(&ctx.tenant(), id, patch)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Location {id} not found")))
    }

    /// Delete a location.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        ctx.authorize(&self.permissions, Module::Locations, Action::Delete).await?;
        if !self.locations.delete(&ctx.tenant(), id).await? {
            return Err(AppError::not_found(format!("Location {id} not found")));
        }
        info!(location_id = %id, "Location deleted");
        Ok(())
    }
}
