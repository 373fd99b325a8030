use std::{collections::BTreeSet, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    note::Note,
    sort::{sort_notes, SortSpec},
};

/// Identities of pinned notes.
///
/// Cloning shares the underlying set. Every change goes through [`PinSet::toggle`], which
/// copies the set before writing, so a `PinSet` held elsewhere never changes under its owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PinSet(Arc<BTreeSet<String>>);

impl PinSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn toggle(&self, path: &str) -> PinSet {
        let mut inner = Arc::clone(&self.0);
        let set = Arc::make_mut(&mut inner);
        if !set.remove(path) {
            set.insert(path.to_owned());
        }
        PinSet(inner)
    }
}

impl From<Vec<String>> for PinSet {
    fn from(paths: Vec<String>) -> Self {
        PinSet(Arc::new(paths.into_iter().collect()))
    }
}

impl From<PinSet> for Vec<String> {
    fn from(pins: PinSet) -> Self {
        pins.0.iter().cloned().collect()
    }
}

impl<'a> FromIterator<&'a str> for PinSet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        PinSet(Arc::new(iter.into_iter().map(ToOwned::to_owned).collect()))
    }
}

#[must_use]
pub fn toggle_pin(pins: &PinSet, path: &str) -> PinSet {
    let toggled = pins.toggle(path);
    debug!("Toggled pin for {path}: now {} pinned", toggled.len());
    toggled
}

pub fn sort_with_pins<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    sort: &SortSpec,
    pins: &PinSet,
) -> Vec<&'a Note> {
    let sorted = sort_notes(notes, sort);
    if pins.is_empty() {
        return sorted;
    }

    let (mut pinned, unpinned): (Vec<_>, Vec<_>) =
        sorted.into_iter().partition(|note| pins.contains(&note.path));
    pinned.extend(unpinned);
    pinned
}
