//! Search tag derivation
//!
//! Every item carries its lowercased name as one tag, plus one tag per
//! lowercased description word longer than [`MIN_WORD_CHARS`] characters.
//! Tags are regenerated wholesale whenever an item is written.

/// Description words must be strictly longer than this to become tags
pub const MIN_WORD_CHARS: usize = 3;

/// Derive the tag set for an item.
///
/// Order is name tag first, then description words in order of first
/// appearance. Duplicates are dropped.
///
/// # Example
/// ```
/// use stockroom_server::models::derive_tags;
///
/// let tags = derive_tags("Shelf", Some("a sturdy wooden shelf"));
/// assert_eq!(tags, vec!["shelf", "sturdy", "wooden"]);
/// ```
pub fn derive_tags(name: &str, description: Option<&str>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    let name_tag = name.to_lowercase();
    if !name_tag.is_empty() {
        tags.push(name_tag);
    }

    if let Some(description) = description {
        for word in description.to_lowercase().split_whitespace() {
            if word.chars().count() > MIN_WORD_CHARS && !tags.iter().any(|t| t == word) {
                tags.push(word.to_owned());
            }
        }
    }

    tags
}
