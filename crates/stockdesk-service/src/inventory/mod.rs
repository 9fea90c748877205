//! Inventory services: catalogue items, stock locations, and the ledger.

pub mod item;
pub mod ledger;
pub mod location;

pub use item::{CreateItemInput, ItemListQuery, ItemService, UpdateItemInput};
pub use ledger::{CorrectEntryInput, LedgerListQuery, LedgerService, RecordEntryInput, StockLevel};
pub use location::{CreateLocationInput, LocationService, UpdateLocationInput};
