use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use tracing::trace;

use crate::hierarchy;

/// A single frontmatter value. Lists and nested maps are not representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Hosts send dates as strings; both forms sort the same.
    Date(DateTime<Utc>),
}

impl FrontmatterValue {
    fn from_yaml(value: &serde_yaml::Value) -> Option<Self> {
        match value {
            serde_yaml::Value::Null => Some(Self::Null),
            serde_yaml::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_yaml::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_yaml::Value::String(s) => Some(Self::String(s.clone())),
            serde_yaml::Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
            serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontmatter(pub BTreeMap<String, FrontmatterValue>);

impl Frontmatter {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FrontmatterValue> {
        self.0.get(key)
    }

    #[must_use]
    pub fn from_yaml(mapping: &Mapping) -> Self {
        let inner = mapping
            .iter()
            .filter_map(|(key, value)| {
                let Some(key) = key.as_str() else {
                    trace!("Skipping non-string frontmatter key: {key:?}");
                    return None;
                };
                let Some(value) = FrontmatterValue::from_yaml(value) else {
                    trace!("Skipping non-scalar frontmatter value for '{key}'");
                    return None;
                };
                Some((key.to_owned(), value))
            })
            .collect();
        Frontmatter(inner)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Invalid frontmatter YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Frontmatter must be a mapping")]
    NotAMapping,
}

/// A note as the browsing pipeline sees it. Records are never modified by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identity, also the key for pinning.
    pub path: String,
    pub title: String,
    /// Canonical folder path, `""` for the vault root.
    #[serde(default)]
    pub folder: String,
    #[serde(default, deserialize_with = "nullable_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub frontmatter: Option<Frontmatter>,
    pub modified_at: DateTime<Utc>,
}

fn nullable_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn split_frontmatter(source: &str) -> Option<(&str, &str)> {
    let rest = source.strip_prefix("---\n")?;
    if let Some(body) = rest.strip_prefix("---\n") {
        return Some(("", body));
    }
    match rest.find("\n---\n") {
        Some(end) => Some((&rest[..=end], &rest[end + "\n---\n".len()..])),
        None => rest.strip_suffix("\n---").map(|yaml| (yaml, "")),
    }
}

fn tags_from_yaml(mapping: &Mapping) -> Vec<String> {
    let value = mapping.get("tags").or_else(|| mapping.get("tag"));
    let raw: Vec<&str> = match value {
        Some(serde_yaml::Value::String(s)) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .collect(),
        Some(serde_yaml::Value::Sequence(seq)) => {
            seq.iter().filter_map(serde_yaml::Value::as_str).collect()
        }
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(|tag| tag.trim().trim_start_matches('#'))
        .filter(|tag| !tag.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

impl Note {
    pub fn from_markdown(
        path: &str,
        source: &str,
        modified_at: DateTime<Utc>,
    ) -> Result<Self, FrontmatterError> {
        let normalized = path.replace('\\', "/");
        let (folder, file_name) = normalized
            .rsplit_once('/')
            .unwrap_or(("", normalized.as_str()));
        let title = file_name
            .strip_suffix(".md")
            .unwrap_or(file_name)
            .to_owned();

        let (frontmatter, tags) = match split_frontmatter(source) {
            Some((yaml, _body)) if yaml.trim().is_empty() => {
                (Some(Frontmatter::default()), Vec::new())
            }
            Some((yaml, _body)) => {
                let yaml = serde_yaml::from_str::<serde_yaml::Value>(yaml)?;
                let serde_yaml::Value::Mapping(mapping) = yaml else {
                    return Err(FrontmatterError::NotAMapping);
                };
                (
                    Some(Frontmatter::from_yaml(&mapping)),
                    tags_from_yaml(&mapping),
                )
            }
            None => (None, Vec::new()),
        };

        Ok(Note {
            path: path.to_owned(),
            title,
            folder: hierarchy::normalize(folder),
            tags,
            frontmatter,
            modified_at,
        })
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{FrontmatterError, FrontmatterValue, Note};

    fn modified() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap()
    }

    #[test]
    fn from_markdown_with_frontmatter() {
        let source = "---\ntitle: Hello\npriority: 3\ndraft: false\ntags: [ai/ml, \"#work\"]\nlinks:\n  - a\n---\nbody text\n";
        let note = Note::from_markdown("projects/x/Hello World.md", source, modified()).unwrap();

        assert_eq!("Hello World", note.title);
        assert_eq!("projects/x", note.folder);
        assert_eq!(vec!["ai/ml".to_owned(), "work".to_owned()], note.tags);

        let fm = note.frontmatter.unwrap();
        assert_eq!(Some(&FrontmatterValue::Number(3.0)), fm.get("priority"));
        assert_eq!(Some(&FrontmatterValue::Bool(false)), fm.get("draft"));
        assert_eq!(
            Some(&FrontmatterValue::String("Hello".to_owned())),
            fm.get("title")
        );
        assert_eq!(None, fm.get("links"), "lists are not scalar");
    }

    #[test]
    fn from_markdown_without_frontmatter() {
        let note = Note::from_markdown("root.md", "# Just a heading\n", modified()).unwrap();
        assert_eq!("root", note.title);
        assert_eq!("", note.folder);
        assert!(note.tags.is_empty());
        assert!(note.frontmatter.is_none());
    }

    #[test]
    fn from_markdown_string_tags() {
        let source = "---\ntags: \"#a, b/c  d\"\n---\n";
        let note = Note::from_markdown("n.md", source, modified()).unwrap();
        assert_eq!(vec!["a", "b/c", "d"], note.tags);
    }

    #[test]
    fn from_markdown_rejects_scalar_block() {
        let err =
            Note::from_markdown("n.md", "---\njust a string\n---\n", modified()).unwrap_err();
        assert!(matches!(err, FrontmatterError::NotAMapping));
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let note: Note = serde_json::from_value(json!({
            "path": "/a.md",
            "title": "a",
            "tags": null,
            "modifiedAt": "2024-01-01T06:00:00Z",
        }))
        .unwrap();
        assert_eq!("", note.folder);
        assert!(note.tags.is_empty());
        assert!(note.frontmatter.is_none());
        assert_eq!(modified(), note.modified_at);
    }

    #[test]
    fn frontmatter_values_stay_strings_on_the_wire() {
        let value: FrontmatterValue = serde_json::from_value(json!("2024-03-01")).unwrap();
        assert_eq!(FrontmatterValue::String("2024-03-01".to_owned()), value);
        let value: FrontmatterValue = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(FrontmatterValue::Null, value);
    }
}
