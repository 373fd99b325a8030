use std::collections::BTreeSet;

use tracing::debug;

use crate::{hierarchy, note::Note, tag_path::expand_all};

/// Every folder holding a note, plus all of their ancestors, sorted.
///
/// Folder paths are normalized first, so `"/a//b/"` contributes `"a"` and `"a/b"`, and
/// root-like paths such as `"/"` contribute nothing.
pub fn available_folders<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<String> {
    let mut folders = BTreeSet::new();
    for note in notes {
        let folder = hierarchy::normalize(&note.folder);
        if folder.is_empty() {
            continue;
        }
        folders.extend(hierarchy::self_and_ancestors(&folder).map(ToOwned::to_owned));
    }
    let folders = folders.into_iter().collect::<Vec<_>>();
    debug!("Collated {} folders", folders.len());
    folders
}

pub fn available_tags<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<String> {
    let tags = expand_all(
        notes
            .into_iter()
            .flat_map(|note| note.tags.iter().map(String::as_str)),
    )
    .into_iter()
    .collect::<Vec<_>>();
    debug!("Collated {} tags", tags.len());
    tags
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::{available_folders, available_tags};
    use crate::note::Note;

    fn note(folder: &str, tags: &[&str]) -> Note {
        Note {
            path: format!("{folder}/n.md"),
            title: "n".to_owned(),
            folder: folder.to_owned(),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            frontmatter: None,
            modified_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn folders_with_ancestors() {
        let notes = [
            note("projects/x/deep", &[]),
            note("personal", &[]),
            note("", &[]),
            note("projects", &[]),
        ];
        assert_eq!(
            vec!["personal", "projects", "projects/x", "projects/x/deep"],
            available_folders(&notes)
        );
    }

    #[test]
    fn folders_normalized() {
        let notes = [
            note("/", &[]),
            note("\\", &[]),
            note("/a//b/", &[]),
            note("c\\d", &[]),
        ];
        assert_eq!(vec!["a", "a/b", "c", "c/d"], available_folders(&notes));
    }

    #[test]
    fn tags_expanded_and_sorted() {
        let notes = [
            note("", &["work", "ai/ml"]),
            note("", &[]),
            note("", &["ai/nlp", "work"]),
        ];
        assert_eq!(
            vec!["ai", "ai/ml", "ai/nlp", "work"],
            available_tags(&notes)
        );
    }

    #[test]
    fn empty_collection() {
        let notes: [Note; 0] = [];
        assert!(available_folders(&notes).is_empty());
        assert!(available_tags(&notes).is_empty());
    }
}
