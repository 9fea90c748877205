//! Parsing sheet rows into sales summaries.
//!
//! Expected columns: business date (`YYYY-MM-DD`), SKU, quantity sold,
//! gross takings in minor units. Extra columns are ignored.

use chrono::NaiveDate;

/// One parsed sales row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRow {
    /// Trading day.
    pub business_date: NaiveDate,
    /// Item SKU.
    pub sku: String,
    /// Units sold.
    pub quantity: i64,
    /// Gross takings in minor units.
    pub gross_cents: i64,
}

/// Parse every well-formed row, skipping the rest.
pub fn parse_rows(rows: &[Vec<String>]) -> Vec<SalesRow> {
    rows.iter().filter_map(|row| parse_row(row)).collect()
}

fn parse_row(cells: &[String]) -> Option<SalesRow> {
    let cell = |i: usize| cells.get(i).map(|c| c.trim()).filter(|c| !c.is_empty());

    let business_date = NaiveDate::parse_from_str(cell(0)?, "%Y-%m-%d").ok()?;
    let sku = cell(1)?.to_string();
    let quantity = cell(2)?.parse::<i64>().ok()?;
    let gross_cents = cell(3)
        .map(|c| c.replace(',', ""))
        .map_or(Some(0), |c| c.parse::<i64>().ok())?;

    Some(SalesRow {
        business_date,
        sku,
        quantity,
        gross_cents,
    })
}
