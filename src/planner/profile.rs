use chrono::NaiveDate;

use crate::planner::PlanError;
use crate::warehouse::ResultSet;

/// The traveller, read from the first result row. Every booking row repeats
/// these columns, so row 0 is as good as any.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub full_name: String,
    pub first_name: String,
    pub age: i64,
    pub home_city: String,
    pub home_country: String,
    pub interests: String,
    pub favorite_food: String,
}

/// One booked trip. Rows arrive pre-sorted ascending by check-in date.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub city: String,
    pub country: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

fn required_str<'a>(result: &'a ResultSet, row: usize, column: &str) -> Result<&'a str, PlanError> {
    if result.column_index(column).is_none() {
        return Err(PlanError::MissingColumn(column.to_string()));
    }
    result
        .cell(row, column)
        .and_then(|cell| cell.as_str())
        .ok_or_else(|| PlanError::CellType {
            column: column.to_string(),
            expected: "string",
        })
}

fn required_long(result: &ResultSet, row: usize, column: &str) -> Result<i64, PlanError> {
    if result.column_index(column).is_none() {
        return Err(PlanError::MissingColumn(column.to_string()));
    }
    result
        .cell(row, column)
        .and_then(|cell| cell.as_long())
        .ok_or_else(|| PlanError::CellType {
            column: column.to_string(),
            expected: "long",
        })
}

fn required_date(result: &ResultSet, row: usize, column: &str) -> Result<NaiveDate, PlanError> {
    let raw = required_str(result, row, column)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| PlanError::InvalidDate {
        column: column.to_string(),
        value: raw.to_string(),
    })
}

impl UserProfile {
    pub fn from_result(result: &ResultSet) -> Result<Self, PlanError> {
        if result.rows.is_empty() {
            return Err(PlanError::EmptyResultSet);
        }
        Ok(Self {
            full_name: required_str(result, 0, "full_name")?.to_string(),
            first_name: required_str(result, 0, "first_name")?.to_string(),
            age: required_long(result, 0, "age")?,
            home_city: required_str(result, 0, "home_city")?.to_string(),
            home_country: required_str(result, 0, "home_country")?.to_string(),
            interests: required_str(result, 0, "hobbies_interest")?.to_string(),
            favorite_food: required_str(result, 0, "favorite_food")?.to_string(),
        })
    }
}

impl BookingRecord {
    /// One record per row, in result order.
    pub fn from_result(result: &ResultSet) -> Result<Vec<Self>, PlanError> {
        if result.rows.is_empty() {
            return Err(PlanError::EmptyResultSet);
        }
        (0..result.rows.len())
            .map(|row| {
                Ok(Self {
                    city: required_str(result, row, "travel_city")?.to_string(),
                    country: required_str(result, row, "travel_country")?.to_string(),
                    check_in: required_date(result, row, "from_date")?,
                    check_out: required_date(result, row, "to_date")?,
                })
            })
            .collect()
    }
}
