//! Form field validation. Every function returns the cleaned value, or a
//! message which can be shown to the admin as-is.

use chrono::NaiveDate;

pub const NAME_MAX_LEN: usize = 100;
pub const CONTACT_MAX_LEN: usize = 150;
pub const MAX_AGE: i32 = 150;
pub const MAX_GOALS: i32 = 999;

pub fn required_text(
    value: &str,
    field: &str,
    max_len: usize,
) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{field} is required."));
    }
    check_len(value, field, max_len)?;
    Ok(value.to_string())
}

pub fn optional_text(
    value: &str,
    field: &str,
    max_len: usize,
) -> Result<Option<String>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    check_len(value, field, max_len)?;
    Ok(Some(value.to_string()))
}

fn check_len(value: &str, field: &str, max_len: usize) -> Result<(), String> {
    match value.chars().count() <= max_len {
        true => Ok(()),
        false => Err(format!("{field} must be at most {max_len} characters.")),
    }
}

pub fn optional_age(value: &str) -> Result<Option<i32>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<i32>() {
        Ok(age) if (0..=MAX_AGE).contains(&age) => Ok(Some(age)),
        _ => Err(format!("Age must be a whole number between 0 and {MAX_AGE}.")),
    }
}

pub fn required_id(value: &str, field: &str) -> Result<i32, String> {
    match value.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(format!("Please select a {field}.")),
    }
}

/// Lenient parsing for `?tournament=` style query parameters: anything
/// which is not an id counts as "nothing selected".
pub fn query_id(value: Option<&str>) -> Option<i32> {
    value.and_then(|v| v.trim().parse::<i32>().ok())
}

pub fn goals(value: &str, side: &str) -> Result<i32, String> {
    match value.trim().parse::<i32>() {
        Ok(goals) if (0..=MAX_GOALS).contains(&goals) => Ok(goals),
        _ => Err(format!(
            "{side} goals must be a whole number between 0 and {MAX_GOALS}."
        )),
    }
}

/// Dates are submitted by `<input type="date">`, i.e. as `YYYY-MM-DD`.
pub fn match_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| "Please enter the match date as YYYY-MM-DD.".to_string())
}
