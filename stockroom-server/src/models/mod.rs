//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod name;
pub mod patch;
pub mod geometry;
pub mod tags;
pub mod search;

pub use validation::ValidationError;
pub use name::{EntityName, Quantity};
pub use patch::Patch;
pub use geometry::{Point, Rect};
pub use tags::derive_tags;
pub use search::{rank, MatchTier, SearchQuery, Searchable};
