use std::collections::{BTreeMap, BTreeSet};

use crate::hierarchy::{self, SEPARATOR};

#[must_use]
pub fn tag_matches_filter(note_tag: &str, filter_tag: &str) -> bool {
    hierarchy::matches(note_tag, filter_tag)
}

/// Every path implied by `tags`: each tag plus all of its ancestors.
///
/// `"a/b/c"` contributes `"a"`, `"a/b"` and `"a/b/c"`. Empty segments are skipped, so
/// `"a//b/"` contributes `"a"` and `"a/b"`.
pub fn expand_all<'a>(tags: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    let mut expanded = BTreeSet::new();
    for tag in tags {
        let mut prefix = String::new();
        for segment in tag.split(SEPARATOR).filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push(SEPARATOR);
            }
            prefix.push_str(segment);
            expanded.insert(prefix.clone());
        }
    }
    expanded
}

/// Parent to children map over the expanded tag vocabulary. Top-level tags are keyed under
/// `""`. Built fresh on every call.
pub fn tag_hierarchy<'a>(
    tags: impl IntoIterator<Item = &'a str>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut tree: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for path in expand_all(tags) {
        let parent = path
            .rfind(SEPARATOR)
            .map_or_else(String::new, |i| path[..i].to_owned());
        tree.entry(parent).or_default().insert(path);
    }
    tree
}
