use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    filter::{apply_filters_at, FilterSpec},
    note::Note,
    pin::{sort_with_pins, PinSet},
    sort::SortSpec,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub pinned: PinSet,
}

pub fn compose_at<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    state: &ViewState,
    now: DateTime<Utc>,
) -> Vec<&'a Note> {
    debug!("Composing view: {state:?}");
    let filtered = apply_filters_at(notes, &state.filter, now);
    let view = sort_with_pins(filtered, &state.sort, &state.pinned);
    debug!("Composed view of {} notes", view.len());
    view
}

pub fn compose<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    state: &ViewState,
) -> Vec<&'a Note> {
    compose_at(notes, state, Utc::now())
}

#[derive(Debug, Serialize)]
pub struct Page<'a> {
    pub total: usize,
    pub notes: Vec<&'a Note>,
}

#[must_use]
pub fn paginate(view: Vec<&Note>, offset: Option<usize>, limit: Option<usize>) -> Page<'_> {
    let total = view.len();
    let notes = view
        .into_iter()
        .skip(offset.unwrap_or(0))
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    Page { total, notes }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Neighbors<'a> {
    pub note: &'a Note,
    pub index: usize,
    pub prev_path: Option<&'a str>,
    pub next_path: Option<&'a str>,
}

#[must_use]
pub fn neighbors<'a>(view: &[&'a Note], path: &str) -> Option<Neighbors<'a>> {
    let index = view.iter().position(|note| note.path == path)?;
    let prev_path = index
        .checked_sub(1)
        .and_then(|i| view.get(i).copied())
        .map(|note| note.path.as_str());
    let next_path = view
        .get(index + 1)
        .copied()
        .map(|note| note.path.as_str());
    Some(Neighbors {
        note: view[index],
        index,
        prev_path,
        next_path,
    })
}

#[cfg(test)]
mod test {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{compose_at, neighbors, paginate, ViewState};
    use crate::note::Note;

    macro_rules! deserial {
        ($tokens:tt) => {
            serde_json::from_value(json!($tokens)).unwrap()
        };
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn notes() -> Vec<Note> {
        vec![
            deserial!({
                "path": "/a.md", "title": "a", "folder": "work", "tags": ["ai/ml"],
                "frontmatter": { "priority": 2 },
                "modifiedAt": now() - Duration::days(1),
            }),
            deserial!({
                "path": "/b.md", "title": "b", "folder": "work/x",
                "frontmatter": { "priority": 1 },
                "modifiedAt": now() - Duration::days(2),
            }),
            deserial!({
                "path": "/c.md", "title": "c", "folder": "home",
                "modifiedAt": now() - Duration::days(3),
            }),
            deserial!({
                "path": "/d.md", "title": "d", "folder": "work",
                "frontmatter": { "priority": 3 },
                "modifiedAt": now() - Duration::days(4),
            }),
        ]
    }

    fn paths(notes: &[&Note]) -> Vec<String> {
        notes.iter().map(|n| n.path.clone()).collect()
    }

    #[test]
    fn default_state_is_newest_first() {
        let notes = notes();
        let view = compose_at(&notes, &ViewState::default(), now());
        assert_eq!(vec!["/a.md", "/b.md", "/c.md", "/d.md"], paths(&view));
    }

    #[test]
    fn filter_sort_pin() {
        let notes = notes();
        let state: ViewState = deserial!({
            "filter": { "includeFolders": ["work"] },
            "sort": { "key": "priority", "direction": "asc" },
            "pinned": ["/d.md", "/c.md"],
        });
        let view = compose_at(&notes, &state, now());
        assert_eq!(vec!["/d.md", "/b.md", "/a.md"], paths(&view));
    }

    #[test]
    fn pages() {
        let notes = notes();
        let view = compose_at(&notes, &ViewState::default(), now());

        let page = paginate(view.clone(), Some(1), Some(2));
        assert_eq!(4, page.total);
        assert_eq!(vec!["/b.md", "/c.md"], paths(&page.notes));

        let page = paginate(view.clone(), Some(3), None);
        assert_eq!(vec!["/d.md"], paths(&page.notes));

        let page = paginate(view, Some(10), Some(2));
        assert!(page.notes.is_empty());
    }

    #[test]
    fn finds_neighbors() {
        let notes = notes();
        let view = compose_at(&notes, &ViewState::default(), now());

        let first = neighbors(&view, "/a.md").unwrap();
        assert_eq!(
            (0, None, Some("/b.md")),
            (first.index, first.prev_path, first.next_path)
        );

        let middle = neighbors(&view, "/c.md").unwrap();
        assert_eq!("/c.md", middle.note.path);
        assert_eq!(
            (Some("/b.md"), Some("/d.md")),
            (middle.prev_path, middle.next_path)
        );

        let last = neighbors(&view, "/d.md").unwrap();
        assert_eq!((Some("/c.md"), None), (last.prev_path, last.next_path));

        assert!(neighbors(&view, "/missing.md").is_none());
    }

    #[test]
    fn state_round_trips_through_settings() {
        let state: ViewState = deserial!({
            "filter": { "excludeTags": ["archive"] },
            "pinned": ["/a.md"],
        });
        let saved = serde_json::to_value(&state).unwrap();
        assert_eq!(json!(["/a.md"]), saved["pinned"]);
        assert_eq!(json!({ "key": "mtime", "direction": "desc" }), saved["sort"]);
        let restored: ViewState = serde_json::from_value(saved).unwrap();
        assert_eq!(state, restored);
    }
}
