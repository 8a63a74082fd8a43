//! Common types and utilities shared across domain models

use std::cmp::Ordering;

/// Trait for types that can validate themselves
pub trait Validator {
    /// Validates the instance and returns errors if invalid
    fn validate(&self) -> Result<(), Vec<String>>;

    /// Returns true if the instance is valid
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Compares two strings the way a user-facing list expects them ordered.
///
/// Letters are compared case-insensitively first. Strings that differ only in
/// case are then ordered lowercase-first at the first differing character,
/// so `"api" < "Api" < "apis"`.
///
/// This is not a full locale collation: after lowercasing, characters compare
/// by code point, so accented letters sort after every ASCII letter
/// (`"éclair" > "fig"`).
pub fn collate(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    if primary != Ordering::Equal {
        return primary;
    }

    for (x, y) in a.chars().zip(b.chars()) {
        if x == y {
            continue;
        }
        return match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => x.cmp(&y),
        };
    }

    a.len().cmp(&b.len())
}
