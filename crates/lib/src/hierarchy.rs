//! `/`-delimited path hierarchies, shared by folder paths and tag paths.

pub const SEPARATOR: char = '/';

/// Whether `candidate` is `filter` itself or one of its descendants.
///
/// The relation is asymmetric: `"a/b"` matches the filter `"a"`, but `"a"` does not match
/// the filter `"a/b"`. A shared string prefix is not enough, the separator has to follow it,
/// so `"projectile"` never matches `"project"`.
///
/// No normalization happens here. Use [`normalize`] first when inputs may carry `\` or
/// redundant separators.
#[must_use]
pub fn matches(candidate: &str, filter: &str) -> bool {
    if candidate == filter {
        return true;
    }
    // Nothing descends from the empty path by concatenation.
    if filter.is_empty() {
        return false;
    }
    candidate
        .strip_prefix(filter)
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

/// Canonical form of a raw path: `/` and `\` both separate, leading and trailing separators
/// are stripped and repeats collapse. Root-like inputs such as `"/"` become `""`.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.split(|c: char| c == '/' || c == '\\')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Proper ancestors of a canonical path, shallowest first. `"a/b/c"` yields `"a"`, `"a/b"`.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices(SEPARATOR)
        .map(move |(i, _)| &path[..i])
        .filter(|ancestor| !ancestor.is_empty())
}

pub fn self_and_ancestors(path: &str) -> impl Iterator<Item = &str> {
    ancestors(path).chain(std::iter::once(path))
}
