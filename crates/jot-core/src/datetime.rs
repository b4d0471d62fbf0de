use anyhow::anyhow;
use chrono::{Days, Local, NaiveDate};

const CALENDAR_FMT: &str = "%Y-%m-%d";

/// Serde adapter for the stored `dueDate` field: an ISO calendar date, or the
/// empty string for "no due date".
pub mod calendar_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::CALENDAR_FMT;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(value) => {
                serializer.serialize_str(&value.format(CALENDAR_FMT).to_string())
            }
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(trimmed, CALENDAR_FMT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses a user-entered due date expression relative to `today`.
/// Accepts `""`/`none`, `today`, `tomorrow`, `+Nd`, and ISO dates.
pub fn parse_due_expr(input: &str, today: NaiveDate) -> anyhow::Result<Option<NaiveDate>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "none" => return Ok(None),
        "today" => return Ok(Some(today)),
        "tomorrow" => {
            return today
                .checked_add_days(Days::new(1))
                .map(Some)
                .ok_or_else(|| anyhow!("due date out of range: {trimmed}"));
        }
        _ => {}
    }

    if let Some(rest) = trimmed.strip_prefix('+')
        && let Some(days) = rest.strip_suffix('d')
    {
        let count: u64 = days
            .parse()
            .map_err(|_| anyhow!("invalid day offset: {trimmed}"))?;
        return today
            .checked_add_days(Days::new(count))
            .map(Some)
            .ok_or_else(|| anyhow!("due date out of range: {trimmed}"));
    }

    NaiveDate::parse_from_str(trimmed, CALENDAR_FMT)
        .map(Some)
        .map_err(|_| anyhow!("unrecognized due date: {trimmed}"))
}

pub fn format_due(due: Option<NaiveDate>) -> String {
    due.map(|value| value.format(CALENDAR_FMT).to_string())
        .unwrap_or_default()
}
