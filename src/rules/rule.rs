//! Path rules and relative-path keys.

use std::path::{Component, Path};

/// Whether a rule protects or permits deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Protected,
    Safe,
}

/// A relative path that matches itself and everything beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    path: String,
    kind: RuleKind,
}

impl PathRule {
    pub fn new(path: &str, kind: RuleKind) -> Self {
        Self {
            path: normalize_key(path),
            kind,
        }
    }

    pub fn protected(path: &str) -> Self {
        Self::new(path, RuleKind::Protected)
    }

    pub fn safe(path: &str) -> Self {
        Self::new(path, RuleKind::Safe)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Exact match, or `rel` lies beneath the rule's path.
    pub fn matches(&self, rel: &str) -> bool {
        is_within(rel, &self.path)
    }

    /// The rule's path lies strictly beneath `dir`.
    pub fn is_nested_in(&self, dir: &str) -> bool {
        !self.path.eq_ignore_ascii_case(dir) && is_within(&self.path, dir)
    }
}

/// `path` equals `prefix` or is a descendant of it, on component boundaries.
///
/// Segments compare ASCII case-insensitively, matching how project trees
/// resolve on case-insensitive filesystems.
pub fn is_within(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    let mut segments = path.split('/');
    prefix
        .split('/')
        .all(|wanted| matches!(segments.next(), Some(seg) if seg.eq_ignore_ascii_case(wanted)))
}

/// Two keys name the same path, ignoring ASCII case.
pub fn same_key(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Normalize a user-written relative path: `\` becomes `/`, no leading,
/// trailing or doubled separators, no `.` segments.
pub fn normalize_key(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Key for `path` relative to `base`, joined with `/`.
///
/// Returns `None` when `path` is not beneath `base` or contains
/// non-normal components.
pub fn relative_key(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}
