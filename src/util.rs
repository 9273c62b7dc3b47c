// Small console formatting helpers.
use crate::types::Filter;
use num_format::{Locale, ToFormattedString};

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages, e.g. `1,204 rows loaded`.
    n.to_formatted_string(&Locale::en)
}

/// One-line description of the active filter for report headings.
pub fn describe_filter(filter: &Filter) -> String {
    let mut parts = Vec::new();
    if let Some(c) = &filter.client {
        parts.push(format!("client={}", c));
    }
    if let Some(t) = &filter.team {
        parts.push(format!("team={}", t));
    }
    if let Some(k) = &filter.kind {
        parts.push(format!("type={}", k));
    }
    if let Some(p) = &filter.phase {
        parts.push(format!("phase={}", p));
    }
    if let Some(m) = filter.month {
        parts.push(format!("month={}", m));
    }
    if parts.is_empty() {
        "no filters".to_string()
    } else {
        parts.join(", ")
    }
}
