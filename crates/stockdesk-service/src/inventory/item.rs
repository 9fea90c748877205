//! Catalogue items.

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
use stockdesk_core::types::{Filter, FilterField, PageRequest, PageResponse, SortField};
use stockdesk_database::{RecordStore, TenantRepository};
use stockdesk_entity::inventory::Item;
use stockdesk_entity::role::{Action, Module};

use crate::context::RequestContext;
use crate::validation::validate_input;

/// Request to create an item.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateItemInput {
    /// Stock-keeping unit code.
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub sku: String,
    /// Display name.
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    /// Unit of measure.
    #[serde(default = "default_unit")]
    #[validate(length(min = 1, max = 16))]
    pub unit: String,
    /// Sale price in minor currency units.
    #[validate(range(min = 0, message = "cannot be negative"))]
    pub price_cents: i64,
    /// Reorder threshold.
    #[serde(default)]
    #[validate(range(min = 0, message = "cannot be negative"))]
    pub reorder_level: i64,
}

/// Request to change an item. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateItemInput {
    /// New SKU.
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub sku: Option<String>,
    /// New name.
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    /// New unit.
    #[validate(length(min = 1, max = 16))]
    pub unit: Option<String>,
    /// New price.
    #[validate(range(min = 0, message = "cannot be negative"))]
    pub price_cents: Option<i64>,
    /// New reorder threshold.
    #[validate(range(min = 0, message = "cannot be negative"))]
    pub reorder_level: Option<i64>,
    /// Activate or retire the item.
    pub is_active: Option<bool>,
}

/// Item listing parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemListQuery {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    /// Only active (or only inactive) items.
    pub active: Option<bool>,
}

fn default_unit() -> String {
    "each".to_string()
}

/// CRUD over the caller's catalogue.
#[derive(Debug, Clone)]
pub struct ItemService {
    items: TenantRepository<Item>,
    permissions: PermissionEvaluator,
}

impl ItemService {
    /// Create a new item service.
    pub fn new(records: Arc<dyn RecordStore>, permissions: PermissionEvaluator) -> Self {
        Self {
            items: TenantRepository::new(records),
            permissions,
        }
    }

    /// One page of items, ordered by SKU.
    pub async fn list(&self, ctx: &RequestContext, query: ItemListQuery, page: PageRequest) -> AppResult<PageResponse<Item>> {
        ctx.authorize(&self.permissions, Module::Items, Action::Read).await?;

        let mut filter = Filter::new();
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter = filter.and(FilterField::ilike("name", format!("%{}%", escape_like(search))));
        }
        if let Some(active) = query.active {
            filter = filter.eq("is_active", active);
        }

        self.items
            .find_page(&ctx.tenant(), filter, vec![SortField::asc("sku")], page)
            .await
    }

    /// One item. Items of other companies are reported as not found.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Item> {
        ctx.authorize(&self.permissions, Module::Items, Action::Read).await?;
        self.items.get(&ctx.tenant(), id).await
    }

    /// Create an item.
    pub async fn create(&self, ctx: &RequestContext, input: CreateItemInput) -> AppResult<Item> {
        ctx.authorize(&self.permissions, Module::Items, Action::Create).await?;
        validate_input(&input)?;
        let sku = input.sku.trim().to_string();
        self.ensure_sku_free(ctx, &sku, None).await?;

        let now = Utc::now();
        let item = Item {
            id: Uuid::now_v7(),
            company_id: Uuid::nil(),
            sku,
            name: input.name.trim().to_string(),
            unit: input.unit,
            price_cents: input.price_cents,
            reorder_level: input.reorder_level,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let item = self.items.create(&ctx.tenant(), &item).await?;
        info!(item_id = %item.id, sku = %item.sku, "Item created");
        Ok(item)
    }

    /// Change an item.
    pub async fn update(&self, ctx: &RequestContext, id: Uuid, input: UpdateItemInput) -> AppResult<Item> {
        ctx.authorize(&self.permissions, Module::Items, Action::Update).await?;
        validate_input(&input)?;

        let mut patch = Map::new();
        if let Some(sku) = input.sku {
            let sku = sku.trim().to_string();
            self.ensure_sku_free(ctx, &sku, Some(id)).await?;
            patch.insert("sku".to_string(), json!(sku));
        }
        if let Some(name) = input.name {
            patch.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(unit) = input.unit {
            patch.insert("unit".to_string(), json!(unit));
        }
        if let Some(price) = input.price_cents {
            patch.insert("price_cents".to_string(), json!(price));
        }
        if let Some(level) = input.reorder_level {
            patch.insert("reorder_level".to_string(), json!(level));
        }
        if let Some(active) = input.is_active {
            patch.insert("is_active".to_string(), json!(active));
        }
        patch.insert("updated_at".to_string(), json!(Utc::now()));

        self.items
            .update(&ctx.tenant(), id, patch)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))
    }

    /// Delete an item.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        ctx.authorize(&self.permissions, Module::Items, Action::Delete).await?;
        if !self.items.delete(&ctx.tenant(), id).await? {
            return Err(AppError::not_found(format!("Item {id} not found")));
        }
        info!(item_id = %id, "Item deleted");
        Ok(())
    }

    async fn ensure_sku_free(&self, ctx: &RequestContext, sku: &str, except: Option<Uuid>) -> AppResult<()> {
        match self.items.find_one(&ctx.tenant(), Filter::new().eq("sku", sku)).await? {
            Some(item) if Some(item.id) != except => {
                Err(AppError::conflict(format!("SKU '{sku}' is already in use")))
            }
            _ => Ok(()),
        }
    }
}

/// Escape `LIKE` wildcards in user input.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
