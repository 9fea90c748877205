//! Append-only inventory ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why stock moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    /// Goods received from a supplier.
    Receipt,
    /// Goods sold.
    Sale,
    /// Stock count adjustment.
    Adjustment,
    /// Movement between locations.
    Transfer,
    /// Compensating entry that reverses an earlier one.
    Correction,
    /// Sales imported from a POS summary.
    PosImport,
}

/// One stock movement. Never updated or deleted once written; mistakes
/// are reversed with a [`LedgerReason::Correction`] entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Item that moved.
    pub item_id: Uuid,
    /// Location where it moved.
    pub location_id: Uuid,
    /// Signed quantity change.
    pub quantity_delta: i64,
    /// Reason for the movement.
    pub reason: LedgerReason,
    /// External reference (invoice, receipt number, ...).
    #[serde(default)]
    pub reference: Option<String>,
    /// Entry that this one reverses.
    #[serde(default)]
    pub corrects_entry_id: Option<Uuid>,
    /// User who recorded the entry. `None` for system imports.
    #[serde(default)]
    pub created_by: Option<Uuid>,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Id of the entry that cancels `self`. Derived from `self.id`, so a
    /// second compensation collides with the first on insert.
    pub fn compensation_id(&self) -> Uuid {
        Uuid::new_v5(&self.id, b"correction")
    }

    /// Build the entry that cancels `self`.
    pub fn compensation(&self, created_by: Uuid, reference: Option<String>) -> Self {
        Self {
            id: self.compensation_id(),
            company_id: self.company_id,
            item_id: self.item_id,
            location_id: self.location_id,
            quantity_delta: -self.quantity_delta,
            reason: LedgerReason::Correction,
            reference,
            corrects_entry_id: Some(self.id),
            created_by: Some(created_by),
            created_at: Utc::now(),
        }
    }
}

crate::tenant_entity!(LedgerEntry, "inventory_ledger", append_only = true);
