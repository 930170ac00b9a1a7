//! Path classification.
//!
//! This module provides:
//! - The cleaning categories and their processing order
//! - Protected/safe path rules
//! - The classifier deciding whether a relative path may be deleted

mod category;
mod classifier;
mod rule;

pub use category::{CategorySet, CleanCategory, ScanBase};
pub use classifier::{CategoryRules, Classification, RuleSet};
pub use rule::{is_within, normalize_key, relative_key, same_key, PathRule, RuleKind};
