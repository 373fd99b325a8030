use std::{borrow::Cow, cmp::Ordering, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::note::{FrontmatterValue, Note};

/// Sort key that always refers to [`Note::modified_at`] rather than a frontmatter field.
pub const MODIFIED_KEY: &str = "mtime";

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y",
];

#[derive(Debug, thiserror::Error)]
#[error("Unknown sort direction '{0}', expected 'asc' or 'desc'")]
pub struct ParseSortDirectionError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = ParseSortDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(ParseSortDirectionError(s.to_owned())),
        }
    }
}

impl TryFrom<String> for SortDirection {
    type Error = ParseSortDirectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortDirection> for &'static str {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    #[serde(alias = "sortKey")]
    pub key: String,
    #[serde(default, alias = "order")]
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            key: MODIFIED_KEY.to_owned(),
            direction: SortDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortValue<'a> {
    Timestamp(DateTime<Utc>),
    Text(Cow<'a, str>),
    Number(f64),
    Bool(bool),
}

/// Normalized sort value with a total order.
///
/// Values of one kind compare naturally. Mixed kinds order as numbers, then booleans, then
/// text, so a field that holds numbers on some notes and text on others still sorts
/// deterministically.
#[derive(Debug, Clone)]
pub enum Comparable {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Comparable {
    fn rank(&self) -> u8 {
        match self {
            Comparable::Number(_) => 0,
            Comparable::Bool(_) => 1,
            Comparable::Text(_) => 2,
        }
    }
}

impl Ord for Comparable {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Number(a), Comparable::Number(b)) => a.total_cmp(b),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::Text(a), Comparable::Text(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Comparable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Comparable {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Comparable {}

fn has_four_digit_run(raw: &str) -> bool {
    raw.as_bytes()
        .windows(4)
        .any(|w| w.iter().all(u8::is_ascii_digit))
}

fn parse_any(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .or_else(|| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok())
                .or_else(|| NaiveDate::parse_from_str(&format!("{raw}-01-01"), "%Y-%m-%d").ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Parses a date-like string, refusing anything that is unlikely to be meant as a date.
///
/// Strings shorter than 4 characters or without a 4-digit year are rejected before parsing,
/// as are results outside 1900..=2100. Times without an offset are taken as UTC.
#[must_use]
pub fn parse_date_safe(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.len() < 4 || !has_four_digit_run(raw) {
        return None;
    }
    parse_any(raw).filter(in_year_range)
}

fn in_year_range(dt: &DateTime<Utc>) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&dt.year())
}

/// The value `note` sorts by under `key`. Missing or null fields fall back to the
/// modification time.
#[must_use]
pub fn extract_value<'a>(note: &'a Note, key: &str) -> SortValue<'a> {
    let fallback = SortValue::Timestamp(note.modified_at);
    if key == MODIFIED_KEY {
        return fallback;
    }
    match note.frontmatter.as_ref().and_then(|fm| fm.get(key)) {
        None | Some(FrontmatterValue::Null) => fallback,
        Some(FrontmatterValue::String(s)) => {
            parse_date_safe(s).map_or(SortValue::Text(Cow::Borrowed(s)), SortValue::Timestamp)
        }
        // Same outcome as the string this date travels as over the wire.
        Some(FrontmatterValue::Date(dt)) if !in_year_range(dt) => {
            SortValue::Text(Cow::Owned(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
        }
        Some(FrontmatterValue::Date(dt)) => SortValue::Timestamp(*dt),
        Some(FrontmatterValue::Number(n)) => SortValue::Number(*n),
        Some(FrontmatterValue::Bool(b)) => SortValue::Bool(*b),
    }
}

#[must_use]
pub fn normalize(value: &SortValue<'_>) -> Comparable {
    match value {
        #[allow(clippy::cast_precision_loss)]
        SortValue::Timestamp(dt) => Comparable::Number(dt.timestamp_millis() as f64),
        SortValue::Text(s) => Comparable::Text(s.to_lowercase()),
        SortValue::Number(n) => Comparable::Number(*n),
        SortValue::Bool(b) => Comparable::Bool(*b),
    }
}

#[must_use]
pub fn compare(a: &Comparable, b: &Comparable) -> Ordering {
    a.cmp(b)
}

/// Stable sort: notes with equal values keep their input order in either direction.
pub fn sort_notes<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    spec: &SortSpec,
) -> Vec<&'a Note> {
    let mut keyed = notes
        .into_iter()
        .map(|note| (normalize(&extract_value(note, &spec.key)), note))
        .collect::<Vec<_>>();

    keyed.sort_by(|(a, _), (b, _)| spec.direction.apply(compare(a, b)));

    keyed.into_iter().map(|(_, note)| note).collect()
}
