//! Partial-update field values
//!
//! A request body field that is absent leaves the stored value alone.
//! A field that is present replaces it; for nullable columns a JSON
//! `null` deserializes to `Set(None)` and clears the value.
//!
//! Patch fields must be marked `#[serde(default)]` so that a missing
//! key becomes `Unchanged`.

use serde::{Deserialize, Deserializer};

/// A single field in a partial update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Keep whatever is stored.
    #[default]
    Unchanged,
    /// Replace the stored value.
    Set(T),
}

impl<T> Patch<T> {
    /// Resolve against the currently stored value.
    pub fn apply(self, current: T) -> T {
        match self {
            Self::Unchanged => current,
            Self::Set(value) => value,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Transform the new value, propagating validation failures.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Patch<U>, E> {
        match self {
            Self::Unchanged => Ok(Patch::Unchanged),
            Self::Set(value) => f(value).map(Patch::Set),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Patch::Set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default)]
        name: Patch<String>,
        #[serde(default)]
        description: Patch<Option<String>>,
    }

    #[test]
    fn absent_field_is_unchanged() {
        let body: Body = serde_json::from_str("{}").unwrap();
        assert!(body.name.is_unchanged());
        assert!(body.description.is_unchanged());
    }

    #[test]
    fn null_clears_nullable_field() {
        let body: Body = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(body.description, Patch::Set(None));
    }

    #[test]
    fn value_sets_field() {
        let body: Body =
            serde_json::from_str(r#"{"name": "Bin 4", "description": "blue lid"}"#).unwrap();
        assert_eq!(body.name, Patch::Set("Bin 4".to_string()));
        assert_eq!(body.description, Patch::Set(Some("blue lid".to_string())));
    }

    #[test]
    fn null_on_required_field_is_rejected() {
        assert!(serde_json::from_str::<Body>(r#"{"name": null}"#).is_err());
    }

    #[test]
    fn apply_resolves_against_current() {
        assert_eq!(Patch::Unchanged.apply(3), 3);
        assert_eq!(Patch::Set(7).apply(3), 7);
    }
}
