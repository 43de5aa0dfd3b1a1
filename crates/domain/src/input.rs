//! Input validation helpers shared by the domain commands.

use chrono::NaiveDate;

use crate::error::{DomainError, Result};

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date, naming the offending field on failure.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| DomainError::InvalidInput(format!("failed to parse {field}: {e}")))
}

/// Parses a date when present.
pub fn parse_opt_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value.map(|v| parse_date(field, v)).transpose()
}

/// Rejects empty or whitespace-only required fields.
pub fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(DomainError::InvalidInput(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Checks `0 <= available <= total` for stock counters.
pub fn check_stock(total: i32, available: i32) -> Result<()> {
    if total < 0 || available < 0 || available > total {
        return Err(DomainError::InvalidInput(format!(
            "available_stock must lie within 0..=total_stock (got {available} of {total})"
        )));
    }
    Ok(())
}
