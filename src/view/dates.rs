use chrono::{DateTime, Local, TimeZone, Utc};

/// How a publication date is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DatePolicy {
    /// `dd/mm/yyyy`, used in the headlines list.
    #[default]
    Absolute,
    /// `dd/mm/yyyy hh:mm`, used in the detail view.
    AbsoluteWithTime,
    /// "5 min ago", "3h ago"... falling back to `dd/mm/yyyy` after a year.
    /// Used for search results.
    Relative,
}

pub fn format_published(at: DateTime<Utc>, policy: DatePolicy, now: DateTime<Utc>) -> String {
    format_in(&Local, at, policy, now)
}

fn format_in<Tz: TimeZone>(
    tz: &Tz,
    at: DateTime<Utc>,
    policy: DatePolicy,
    now: DateTime<Utc>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let local = at.with_timezone(tz);
    match policy {
        DatePolicy::Absolute => local.format("%d/%m/%Y").to_string(),
        DatePolicy::AbsoluteWithTime => local.format("%d/%m/%Y %H:%M").to_string(),
        DatePolicy::Relative => {
            relative(at, now).unwrap_or_else(|| local.format("%d/%m/%Y").to_string())
        }
    }
}

fn relative(at: DateTime<Utc>, now: DateTime<Utc>) -> Option<String> {
    // Dates slightly in the future (clock skew) count as "just now".
    let minutes = (now - at).num_minutes().max(0);
    let hours = minutes / 60;
    let days = hours / 24;
    let weeks = days / 7;
    let months = days / 30;

    let text = if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} min ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else if weeks < 4 {
        format!("{weeks}w ago")
    } else if months < 12 {
        format!("{months}mo ago")
    } else {
        return None;
    };
    Some(text)
}
