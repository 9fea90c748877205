//! Inventory entities: items, locations, and the stock ledger.

pub mod item;
pub mod ledger;
pub mod location;

pub use item::Item;
pub use ledger::{LedgerEntry, LedgerReason};
pub use location::Location;
