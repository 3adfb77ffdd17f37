//! Display names for locations, regions and items

use super::ValidationError;

/// Maximum length for a name, in characters
const MAX_NAME_LEN: usize = 200;

/// Validated, trimmed, non-empty name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityName(String);

impl EntityName {
    /// Create a name, trimming surrounding whitespace.
    ///
    /// # Example
    /// ```
    /// use stockroom_server::models::EntityName;
    ///
    /// assert_eq!(EntityName::new("  Garage ").unwrap().as_str(), "Garage");
    /// assert!(EntityName::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }

        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Validated item quantity (non-negative, defaults to 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity(i64);

impl Quantity {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < 0 {
            return Err(ValidationError::OutOfRange {
                field: "quantity",
                value: value.to_string(),
            });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self(1)
    }
}
