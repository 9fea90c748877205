//! The inventory ledger and the stock levels derived from it.
//!
//! Entries are never changed after they are written. A mistake is undone
//! by recording a correction that negates the original delta, and stock
//! on hand is always the sum of deltas.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use stockdesk_auth::PermissionEvaluator;
use stockdesk_core::error::{AppError, ErrorKind};
use stockdesk_core::result::AppResult;
use stockdesk_core::types::{Filter, PageRequest, PageResponse, SortField};
use stockdesk_database::query::{Accumulator, Pipeline};
use stockdesk_database::{RecordStore, TenantRepository};
use stockdesk_entity::inventory::{Item, LedgerEntry, LedgerReason, Location};
use stockdesk_entity::role::{Action, Module};

use crate::context::RequestContext;
use crate::validation::validate_input;

/// Request to record a stock movement.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordEntryInput {
    /// Item that moved.
    pub item_id: Uuid,
    /// Location where it moved.
    pub location_id: Uuid,
    /// Signed quantity change.
    #[validate(custom(function = "non_zero"))]
    pub quantity_delta: i64,
    /// Reason for the movement.
    pub reason: LedgerReason,
    /// External reference.
    #[validate(length(max = 200))]
    pub reference: Option<String>,
}

/// Request to reverse an entry.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CorrectEntryInput {
    /// Why the entry is being reversed.
    #[validate(length(max = 200))]
    pub reference: Option<String>,
}

/// Ledger listing parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerListQuery {
    /// Only entries for this item.
    pub item_id: Option<Uuid>,
    /// Only entries at this location.
    pub location_id: Option<Uuid>,
}

/// Quantity on hand of one item at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Item.
    pub item_id: Uuid,
    /// Location.
    pub location_id: Uuid,
    /// Sum of all deltas.
    pub on_hand: i64,
}

fn non_zero(delta: i64) -> Result<(), ValidationError> {
    if delta == 0 {
        return Err(ValidationError::new("non_zero").with_message("must not be zero".into()));
    }
    Ok(())
}

/// Records, lists, and corrects stock movements.
#[derive(Debug, Clone)]
pub struct LedgerService {
    entries: TenantRepository<LedgerEntry>,
    items: TenantRepository<Item>,
    locations: TenantRepository<Location>,
    permissions: PermissionEvaluator,
}

impl LedgerService {
    /// Create a new ledger service.
    pub fn new(records: Arc<dyn RecordStore>, permissions: PermissionEvaluator) -> Self {
        Self {
            entries: TenantRepository::new(records.clone()),
            items: TenantRepository::new(records.clone()),
            locations: TenantRepository::new(records),
            permissions,
        }
    }

    /// Record a stock movement entered by a user.
    pub async fn record(&self, ctx: &RequestContext, input: RecordEntryInput) -> AppResult<LedgerEntry> {
        ctx.authorize(&self.permissions, Module::Inventory, Action::Create).await?;
        validate_input(&input)?;
        if matches!(input.reason, LedgerReason::Correction | LedgerReason::PosImport) {
            return Err(AppError::validation(
                "Corrections and POS imports are recorded by the system",
            ));
        }

        let tenant = ctx.tenant();
        self.items.get(&tenant, input.item_id).await?;
        let location = self.locations.get(&tenant, input.location_id).await?;
        if !location.is_active {
            return Err(AppError::validation(format!(
                "Location '{}' is closed for stock movements",
                location.code
            )));
        }

        let entry = LedgerEntry {
            id: Uuid::now_v7(),
            company_id: Uuid::nil(),
            item_id: input.item_id,
            location_id: input.location_id,
            quantity_delta: input.quantity_delta,
            reason: input.reason,
            reference: input.reference,
            corrects_entry_id: None,
            created_by: Some(ctx.user_id.into_uuid()),
            created_at: Utc::now(),
        };
        let entry = self.entries.create(&tenant, &entry).await?;
        info!(
            entry_id = %entry.id,
            item_id = %entry.item_id,
            location_id = %entry.location_id,
            delta = entry.quantity_delta,
            "Ledger entry recorded"
        );
        Ok(entry)
    }

    /// One page of entries, newest first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        query: LedgerListQuery,
        page: PageRequest,
    ) -> AppResult<PageResponse<LedgerEntry>> {
        ctx.authorize(&self.permissions, Module::Inventory, Action::Read).await?;
        self.entries
            .find_page(
                &ctx.tenant(),
                movement_filter(query.item_id, query.location_id),
                vec![SortField::desc("created_at"), SortField::desc("id")],
                page,
            )
            .await
    }

    /// One entry.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> AppResult<LedgerEntry> {
        ctx.authorize(&self.permissions, Module::Inventory, Action::Read).await?;
        self.entries.get(&ctx.tenant(), id).await
    }

    /// Reverse an entry with a compensating correction.
    pub async fn correct(&self, ctx: &RequestContext, id: Uuid, input: CorrectEntryInput) -> AppResult<LedgerEntry> {
        ctx.authorize(&self.permissions, Module::Inventory, Action::Create).await?;
        validate_input(&input)?;
        let tenant = ctx.tenant();

        let original = self.entries.get(&tenant, id).await?;
        if original.reason == LedgerReason::Correction {
            return Err(AppError::conflict("A correction cannot itself be corrected"));
        }
        let already = self
            .entries
            .count(&tenant, Filter::new().eq("corrects_entry_id", id))
            .await?;
        if already > 0 {
            return Err(AppError::conflict(format!("Ledger entry {id} has already been corrected")));
        }

        let correction = original.compensation(ctx.user_id.into_uuid(), input.reference);
        let correction = self.entries.create(&tenant, &correction).await.map_err(|e| {
            if e.is(ErrorKind::Conflict) {
                AppError::conflict(format!("Ledger entry {id} has already been corrected"))
            } else {
                e
            }
        })?;
        info!(entry_id = %correction.id, corrects = %id, "Ledger entry corrected");
        Ok(correction)
    }

    /// Attempt to change an entry. Always fails: the ledger is append-only.
    pub async fn update(&self, ctx: &RequestContext, id: Uuid, patch: Map<String, Value>) -> AppResult<LedgerEntry> {
        ctx.authorize(&self.permissions, Module::Inventory, Action::Update).await?;
        self.entries
            .update(&ctx.tenant(), id, patch)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ledger entry {id} not found")))
    }

    /// Attempt to delete an entry. Always fails: the ledger is append-only.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        ctx.authorize(&self.permissions, Module::Inventory, Action::Delete).await?;
        self.entries.delete(&ctx.tenant(), id).await?;
        Ok(())
    }

    /// Quantity on hand per item and location.
    pub async fn stock(&self, ctx: &RequestContext, query: LedgerListQuery) -> AppResult<Vec<StockLevel>> {
        ctx.authorize(&self.permissions, Module::Inventory, Action::Read).await?;

        let pipeline = Pipeline::new()
            .matching(movement_filter(query.item_id, query.location_id))
            .group(
                &["item_id", "location_id"],
                vec![Accumulator::sum("quantity_delta", "on_hand")],
            )
            .sort(vec![SortField::asc("item_id"), SortField::asc("location_id")]);

        self.entries
            .aggregate(&ctx.tenant(), pipeline)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(AppError::from))
            .collect()
    }
}

fn movement_filter(item_id: Option<Uuid>, location_id: Option<Uuid>) -> Filter {
    let mut filter = Filter::new();
    if let Some(item_id) = item_id {
        filter = filter.eq("item_id", item_id);
    }
    if let Some(location_id) = location_id {
        filter = filter.eq("location_id", location_id);
    }
    filter
}
