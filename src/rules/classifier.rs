//! Three-way path classification.

use crate::layout::ProjectLayout;

use super::category::CleanCategory;
use super::rule::{normalize_key, same_key, PathRule};

/// Outcome of classifying one relative path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Must never be deleted.
    Protected,
    /// May be deleted when its category is selected.
    Safe,
    /// Matches no rule; treated as non-deletable.
    Unclassified,
}

/// Rule table for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRules {
    pub category: CleanCategory,
    /// Directories walked for candidates, relative to the category's base.
    pub scan_roots: Vec<String>,
    /// Safe roots for this category.
    pub safe: Vec<PathRule>,
    /// Safe caches deleted recursively as one unit.
    pub subtrees: Vec<String>,
}

impl CategoryRules {
    pub fn new(category: CleanCategory) -> Self {
        Self {
            category,
            scan_roots: Vec::new(),
            safe: Vec::new(),
            subtrees: Vec::new(),
        }
    }

    pub fn scan(mut self, root: &str) -> Self {
        self.scan_roots.push(normalize_key(root));
        self
    }

    pub fn safe(mut self, root: &str) -> Self {
        self.safe.push(PathRule::safe(root));
        self
    }

    pub fn subtree(mut self, root: &str) -> Self {
        self.subtrees.push(normalize_key(root));
        self
    }
}

/// The complete classification table: a global protected list plus
/// per-category safe roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    protected: Vec<PathRule>,
    categories: Vec<CategoryRules>,
}

impl RuleSet {
    /// An empty rule set. Everything is unclassified.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the rule set for a layout, adding `extra_protected` to the
    /// layout's own protected list.
    pub fn from_layout(layout: &dyn ProjectLayout, extra_protected: &[String]) -> Self {
        let mut rules = Self::new();

        for path in layout.protected_paths() {
            rules = rules.protect(path);
        }
        for path in extra_protected {
            rules = rules.protect(path);
        }

        let mut temp = CategoryRules::new(CleanCategory::TemporaryFiles);
        for root in layout.temp_roots() {
            temp = temp.scan(root).safe(root);
        }

        let mut library = CategoryRules::new(CleanCategory::LibraryCache);
        for root in layout.library_roots() {
            library = library.scan(root).safe(root);
        }
        for subtree in layout.cache_subtrees() {
            library = library.subtree(subtree.path);
        }

        let mut editor = CategoryRules::new(CleanCategory::EditorCache);
        for root in layout.editor_cache_roots() {
            editor = editor.scan(root).safe(root);
        }

        rules.with_category(temp).with_category(library).with_category(editor)
    }

    /// Add a global protected path.
    pub fn protect(mut self, path: &str) -> Self {
        let rule = PathRule::protected(path);
        let duplicate = self.protected.iter().any(|r| same_key(r.path(), rule.path()));
        if !rule.path().is_empty() && !duplicate {
            self.protected.push(rule);
        }
        self
    }

    /// Add or replace the table for one category.
    pub fn with_category(mut self, rules: CategoryRules) -> Self {
        self.categories.retain(|c| c.category != rules.category);
        self.categories.push(rules);
        self
    }

    pub fn protected_rules(&self) -> &[PathRule] {
        &self.protected
    }

    pub fn category(&self, category: CleanCategory) -> Option<&CategoryRules> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Classify a relative path for a category.
    ///
    /// Protected rules are checked first and short-circuit, so a protected
    /// path is never reported as safe whatever safe roots enclose it.
    pub fn classify(&self, rel: &str, category: CleanCategory) -> Classification {
        if self.is_protected(rel) {
            return Classification::Protected;
        }

        let is_safe = self
            .category(category)
            .map(|c| c.safe.iter().any(|rule| rule.matches(rel)))
            .unwrap_or(false);

        if is_safe {
            Classification::Safe
        } else {
            Classification::Unclassified
        }
    }

    pub fn is_protected(&self, rel: &str) -> bool {
        self.protected.iter().any(|rule| rule.matches(rel))
    }

    /// Protected rules lying strictly inside `dir`.
    ///
    /// A subtree with any such rule cannot be deleted in one step.
    pub fn protected_within(&self, dir: &str) -> Vec<&PathRule> {
        self.protected
            .iter()
            .filter(|rule| rule.is_nested_in(dir))
            .collect()
    }
}
