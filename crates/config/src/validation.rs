//! Section validation

use std::fmt::Display;
use std::ops::RangeInclusive;

pub use crate::error::ValidationError;

/// A named table of the config file
pub trait ConfigSection: Default {
    /// Table name, used as the prefix of field paths in errors
    const SECTION: &'static str;

    /// Returns every problem found, or `Ok` if the section is usable
    fn validate(&self) -> Result<(), Vec<ValidationError>>;
}

/// Collects field problems for one section
///
/// ```
/// use syncledger_config::Validator;
///
/// let result = Validator::section("store")
///     .in_range("max_history_entries", 0usize, 1..=1000)
///     .finish();
/// assert_eq!(result.unwrap_err()[0].field, "store.max_history_entries");
/// ```
#[derive(Debug)]
pub struct Validator {
    section: &'static str,
    errors: Vec<ValidationError>,
}

impl Validator {
    /// Starts checking the fields of `section`
    pub fn section(section: &'static str) -> Self {
        Self {
            section,
            errors: Vec::new(),
        }
    }

    /// Requires `value` to lie in `bounds`
    pub fn in_range<T>(mut self, field: &str, value: T, bounds: RangeInclusive<T>) -> Self
    where
        T: PartialOrd + Display + Copy,
    {
        if !bounds.contains(&value) {
            let message = format!("must be in {}..={}", bounds.start(), bounds.end());
            let error = ValidationError::new(self.path(field), message).with_value(value);
            self.errors.push(error);
        }
        self
    }

    /// Requires `value` to contain something other than whitespace
    pub fn not_empty(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            let error = ValidationError::new(self.path(field), "must not be empty");
            self.errors.push(error);
        }
        self
    }

    pub fn finish(self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn path(&self, field: &str) -> String {
        format!("{}.{}", self.section, field)
    }
}
