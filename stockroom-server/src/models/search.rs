//! Free-text search matching and ranking
//!
//! Query, names and descriptions are compared after lowercasing, the
//! same folding used when tags are stored, so a match never depends on
//! which field it came from.

use std::collections::HashSet;

/// How well an item matched; lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    NamePrefix = 1,
    NameContains = 2,
    DescriptionContains = 3,
    TagOnly = 4,
}

/// Anything the ranker can score.
pub trait Searchable {
    fn search_id(&self) -> i64;
    fn search_name(&self) -> &str;
    fn search_description(&self) -> Option<&str>;
    fn search_tags(&self) -> &[String];
}

/// Normalized, non-empty search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Returns `None` for an empty or whitespace-only query.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify a candidate, or `None` if nothing matches.
    pub fn tier(&self, name: &str, description: Option<&str>, tags: &[String]) -> Option<MatchTier> {
        let q = self.0.as_str();
        let name = name.to_lowercase();

        if name.starts_with(q) {
            return Some(MatchTier::NamePrefix);
        }
        if name.contains(q) {
            return Some(MatchTier::NameContains);
        }
        if description.is_some_and(|d| d.to_lowercase().contains(q)) {
            return Some(MatchTier::DescriptionContains);
        }
        if tags.iter().any(|t| t.contains(q)) {
            return Some(MatchTier::TagOnly);
        }
        None
    }
}

/// Filter and order candidates by match tier.
///
/// Candidates sharing an id are collapsed to the first occurrence. The
/// sort is stable, so within a tier the input order is kept.
pub fn rank<T: Searchable>(query: &SearchQuery, candidates: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut scored: Vec<(MatchTier, T)> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.search_id()))
        .filter_map(|c| {
            query
                .tier(c.search_name(), c.search_description(), c.search_tags())
                .map(|tier| (tier, c))
        })
        .collect();

    scored.sort_by_key(|(tier, _)| *tier);
    scored.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Candidate {
        id: i64,
        name: &'static str,
        description: Option<&'static str>,
        tags: Vec<String>,
    }

    impl Searchable for Candidate {
        fn search_id(&self) -> i64 {
            self.id
        }
        fn search_name(&self) -> &str {
            self.name
        }
        fn search_description(&self) -> Option<&str> {
            self.description
        }
        fn search_tags(&self) -> &[String] {
            &self.tags
        }
    }

    fn candidate(id: i64, name: &'static str, description: Option<&'static str>) -> Candidate {
        Candidate {
            id,
            name,
            description,
            tags: crate::models::derive_tags(name, description),
        }
    }

    fn ids(results: &[Candidate]) -> Vec<i64> {
        results.iter().map(|c| c.id).collect()
    }

    #[test]
    fn empty_query_is_none() {
        assert!(SearchQuery::new("").is_none());
        assert!(SearchQuery::new("   ").is_none());
    }

    #[test]
    fn tiers_order_results() {
        let query = SearchQuery::new("Widget").unwrap();
        let results = rank(
            &query,
            vec![
                candidate(1, "Gadget", Some("a widget-like thing")),
                candidate(2, "Blue Widget", None),
                candidate(3, "Widget", None),
            ],
        );
        assert_eq!(ids(&results), vec![3, 2, 1]);
    }

    #[test]
    fn tag_only_match_ranks_last() {
        let query = SearchQuery::new("ring").unwrap();
        let tagged = Candidate {
            id: 9,
            name: "Seal",
            description: None,
            tags: vec!["o-ring".to_string()],
        };
        let results = rank(
            &query,
            vec![tagged, candidate(1, "Spring clamp", None), candidate(2, "Keyring", None)],
        );
        assert_eq!(ids(&results), vec![1, 2, 9]);
    }

    #[test]
    fn matching_ignores_case() {
        let query = SearchQuery::new("SCREW").unwrap();
        assert_eq!(
            query.tier("Wood screws", None, &[]),
            Some(MatchTier::NameContains)
        );
        assert_eq!(
            query.tier("Box", Some("Assorted Screwdrivers"), &[]),
            Some(MatchTier::DescriptionContains)
        );
    }

    #[test]
    fn non_matching_candidates_dropped() {
        let query = SearchQuery::new("drill").unwrap();
        let results = rank(&query, vec![candidate(1, "Hammer", Some("claw"))]);
        assert!(results.is_empty());
    }

    #[test]
    fn duplicate_ids_collapsed() {
        let query = SearchQuery::new("bolt").unwrap();
        let results = rank(
            &query,
            vec![
                candidate(4, "Bolt", None),
                candidate(4, "Bolt", None),
                candidate(5, "Anchor bolt", None),
            ],
        );
        assert_eq!(ids(&results), vec![4, 5]);
    }

    #[test]
    fn stable_within_tier() {
        let query = SearchQuery::new("nut").unwrap();
        let results = rank(
            &query,
            vec![
                candidate(7, "Nut M4", None),
                candidate(2, "Nut M3", None),
                candidate(5, "Nut M5", None),
            ],
        );
        assert_eq!(ids(&results), vec![7, 2, 5]);
    }
}
