//! Validation rules for configuration values
//!
//! Each config section implements [`ConfigSection`]. Rules return the
//! violation, if any, so a section can list all of them at once.

pub use crate::error::ValidationError;

/// Trait for configuration sections that can validate themselves
pub trait ConfigSection: Default {
    /// Checks every field and reports all violations
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Replaces this section's values with `other`'s
    fn merge(&mut self, other: Self);

    /// Name of the TOML table holding this section
    fn section_name(&self) -> &'static str;
}

/// Rules shared by config sections
pub mod rules {
    use super::ValidationError;

    /// `value` must not exceed `max`
    pub fn at_most(field: &str, value: u64, max: u64) -> Option<ValidationError> {
        (value > max)
            .then(|| ValidationError::new(field, format!("must be at most {}", max)).with_value(value))
    }

    /// `value` must hold more than whitespace
    pub fn not_blank(field: &str, value: &str) -> Option<ValidationError> {
        value
            .trim()
            .is_empty()
            .then(|| ValidationError::new(field, "must not be empty"))
    }

    /// `value` must not be one of `reserved`
    pub fn not_reserved(field: &str, value: &str, reserved: &[&str]) -> Option<ValidationError> {
        reserved
            .contains(&value)
            .then(|| ValidationError::new(field, "is a reserved name").with_value(value))
    }

    /// Turns the outcome of a set of rules into a section result
    pub fn report(
        violations: impl IntoIterator<Item = Option<ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<_> = violations.into_iter().flatten().collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
