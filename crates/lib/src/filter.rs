use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{hierarchy, note::Note, sort::parse_date_safe, tag_path::tag_matches_filter};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatching {
    /// A filter tag also selects its descendants: `"ai"` selects `"ai/ml"`.
    #[default]
    Hierarchical,
    /// A filter tag selects only notes carrying exactly that tag.
    Exact,
}

impl TagMatching {
    fn matches(self, note_tag: &str, filter_tag: &str) -> bool {
        match self {
            TagMatching::Hierarchical => tag_matches_filter(note_tag, filter_tag),
            TagMatching::Exact => note_tag == filter_tag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRangeKind {
    /// Modified on or after the reference day, counted in whole days back from now.
    Within,
    /// Modified at or after the reference instant.
    After,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceDate {
    Timestamp(DateTime<Utc>),
    Millis(i64),
    Raw(String),
    Unusable(serde_yaml::Value),
}

impl ReferenceDate {
    #[must_use]
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            ReferenceDate::Timestamp(dt) => Some(*dt),
            ReferenceDate::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            ReferenceDate::Raw(raw) => parse_date_safe(raw),
            ReferenceDate::Unusable(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default)]
    pub kind: Option<DateRangeKind>,
    #[serde(default)]
    pub reference_date: Option<ReferenceDate>,
}

fn days_ago(date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - date).num_milliseconds().div_euclid(MS_PER_DAY)
}

impl DateRange {
    /// Unknown kinds and unparsable reference dates put no constraint on the note.
    #[must_use]
    pub fn passes_at(&self, modified_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let Some(reference) = self
            .reference_date
            .as_ref()
            .and_then(ReferenceDate::resolve)
        else {
            debug!("Ignoring date range with unusable reference {:?}", self.reference_date);
            return true;
        };
        match self.kind {
            Some(DateRangeKind::Within) => days_ago(modified_at, now) <= days_ago(reference, now),
            Some(DateRangeKind::After) => modified_at >= reference,
            Some(DateRangeKind::Unknown) | None => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub include_folders: Vec<String>,
    pub exclude_folders: Vec<String>,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    /// Case-insensitive substring of the title. Blank means no constraint.
    #[serde(alias = "filenameSubstring")]
    pub filename: String,
    /// Case-insensitive substrings; a title containing any of them is excluded.
    pub exclude_filenames: Vec<String>,
    pub date_range: Option<DateRange>,
    pub tag_matching: TagMatching,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl FilterSpec {
    fn matches_include_folders(&self, note: &Note) -> bool {
        self.include_folders.is_empty()
            || self
                .include_folders
                .iter()
                .any(|folder| hierarchy::matches(&note.folder, folder))
    }

    fn matches_exclude_folders(&self, note: &Note) -> bool {
        !self
            .exclude_folders
            .iter()
            .any(|folder| hierarchy::matches(&note.folder, folder))
    }

    fn matches_include_tags(&self, note: &Note) -> bool {
        self.include_tags.is_empty()
            || note.tags.iter().any(|tag| {
                self.include_tags
                    .iter()
                    .any(|filter| self.tag_matching.matches(tag, filter))
            })
    }

    fn matches_exclude_tags(&self, note: &Note) -> bool {
        !note.tags.iter().any(|tag| {
            self.exclude_tags
                .iter()
                .any(|filter| tag_matches_filter(tag, filter))
        })
    }

    fn matches_filename(&self, note: &Note) -> bool {
        let needle = self.filename.trim();
        needle.is_empty() || contains_ignore_case(&note.title, needle)
    }

    fn matches_exclude_filenames(&self, note: &Note) -> bool {
        !self
            .exclude_filenames
            .iter()
            .map(|pattern| pattern.trim())
            .filter(|pattern| !pattern.is_empty())
            .any(|pattern| contains_ignore_case(&note.title, pattern))
    }

    fn matches_date_range(&self, note: &Note, now: DateTime<Utc>) -> bool {
        self.date_range
            .as_ref()
            .map_or(true, |range| range.passes_at(note.modified_at, now))
    }

    #[must_use]
    pub fn passes_at(&self, note: &Note, now: DateTime<Utc>) -> bool {
        self.matches_include_folders(note)
            && self.matches_exclude_folders(note)
            && self.matches_include_tags(note)
            && self.matches_exclude_tags(note)
            && self.matches_filename(note)
            && self.matches_exclude_filenames(note)
            && self.matches_date_range(note, now)
    }

    #[must_use]
    pub fn passes(&self, note: &Note) -> bool {
        self.passes_at(note, Utc::now())
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.include_folders.is_empty()
            || !self.exclude_folders.is_empty()
            || !self.include_tags.is_empty()
            || !self.exclude_tags.is_empty()
            || !self.filename.trim().is_empty()
            || self.exclude_filenames.iter().any(|p| !p.trim().is_empty())
            || self.date_range.is_some()
    }
}

#[must_use]
pub fn has_active_filter(spec: &FilterSpec) -> bool {
    spec.is_active()
}

pub fn apply_filters_at<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    spec: &FilterSpec,
    now: DateTime<Utc>,
) -> Vec<&'a Note> {
    let filtered = notes
        .into_iter()
        .filter(|note| spec.passes_at(note, now))
        .collect::<Vec<_>>();
    debug!("Filter kept {} notes", filtered.len());
    filtered
}

pub fn apply_filters<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    spec: &FilterSpec,
) -> Vec<&'a Note> {
    apply_filters_at(notes, spec, Utc::now())
}
