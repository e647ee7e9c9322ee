//! Publisher timestamps to ISO-8601 in Moscow time.
//!
//! Each source prints dates its own way:
//!
//! | tag      | example               |
//! |----------|-----------------------|
//! | `ria`    | `14:30 01.06.2024`    |
//! | `lenta`  | `14:30, 1 июня 2024`  |
//! | `rbk`    | `14:30` or `1 июн, 14:30` |
//! | `gazeta` | `1 июня 2024, 14:30`  |
//!
//! Anything that does not match comes back untouched, so a malformed date
//! never costs us the article.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, NaiveTime, Offset, SecondsFormat, TimeZone, Utc};
use nh_core::{Error, Result};

const MOSCOW_OFFSET_SECS: i32 = 3 * 3600;

const MONTHS: &[(&str, u32)] = &[
    ("январь", 1), ("января", 1), ("янв", 1),
    ("февраль", 2), ("февраля", 2), ("фев", 2),
    ("март", 3), ("марта", 3), ("мар", 3),
    ("апрель", 4), ("апреля", 4), ("апр", 4),
    ("май", 5), ("мая", 5),
    ("июнь", 6), ("июня", 6), ("июн", 6),
    ("июль", 7), ("июля", 7), ("июл", 7),
    ("август", 8), ("августа", 8), ("авг", 8),
    ("сентябрь", 9), ("сентября", 9), ("сент", 9), ("сен", 9),
    ("октябрь", 10), ("октября", 10), ("окт", 10),
    ("ноябрь", 11), ("ноября", 11), ("ноя", 11),
    ("декабрь", 12), ("декабря", 12), ("дек", 12),
];

/// UTC+3, no daylight saving.
pub fn moscow() -> FixedOffset {
    FixedOffset::east_opt(MOSCOW_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Normalizes `text` using the pattern registered for `tag`, relative to now.
pub fn normalize(text: &str, tag: &str) -> String {
    normalize_at(text, tag, Utc::now().with_timezone(&moscow()))
}

/// Like [`normalize`], with an explicit reference instant for the patterns
/// that omit the date or the year.
pub fn normalize_at(text: &str, tag: &str, now: DateTime<FixedOffset>) -> String {
    match parse(text, tag, now) {
        Ok(timestamp) => timestamp.to_rfc3339_opts(SecondsFormat::Secs, false),
        Err(e) => {
            tracing::debug!("{}", e);
            text.to_string()
        }
    }
}

pub fn parse(text: &str, tag: &str, now: DateTime<FixedOffset>) -> Result<DateTime<FixedOffset>> {
    let trimmed = text.trim();
    let naive = match tag {
        "ria" => NaiveDateTime::parse_from_str(trimmed, "%H:%M %d.%m.%Y").ok(),
        "lenta" => with_month_number(trimmed)
            .and_then(|s| NaiveDateTime::parse_from_str(&s, "%H:%M, %d %m %Y").ok()),
        "rbk" if trimmed.len() == 5 && trimmed.contains(':') => NaiveTime::parse_from_str(trimmed, "%H:%M")
            .ok()
            .map(|time| now.date_naive().and_time(time)),
        "rbk" => with_month_number(trimmed).and_then(|s| {
            NaiveDateTime::parse_from_str(&format!("{} {}", now.year(), s), "%Y %d %m, %H:%M").ok()
        }),
        "gazeta" => with_month_number(trimmed)
            .and_then(|s| NaiveDateTime::parse_from_str(&s, "%d %m %Y, %H:%M").ok()),
        _ => None,
    };

    naive
        .and_then(|naive| moscow().from_local_datetime(&naive).single())
        .ok_or_else(|| Error::DateFormat {
            tag: tag.to_string(),
            text: text.to_string(),
        })
}

fn month_number(word: &str) -> Option<u32> {
    let word = word.to_lowercase();
    MONTHS
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, number)| *number)
}

/// Swaps the first Russian month name for its two-digit number, keeping a
/// trailing comma. `None` when the text names no month.
fn with_month_number(text: &str) -> Option<String> {
    let mut replaced = false;
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|token| {
            let word = token.trim_end_matches(|c: char| c == ',' || c == '.');
            match month_number(word) {
                Some(month) if !replaced => {
                    replaced = true;
                    let comma = if token.ends_with(',') { "," } else { "" };
                    format!("{:02}{}", month, comma)
                }
                _ => token.to_string(),
            }
        })
        .collect();

    if replaced {
        Some(tokens.join(" "))
    } else {
        None
    }
}
