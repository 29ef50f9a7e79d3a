//! Hierarchical geocell indexing and candidate lookup.
//!
//! Entities are indexed under geohash cells at a fixed ladder of resolution
//! levels. Queries compute a small covering cell set and return a *superset*
//! of candidate keys; exact distance or containment filtering stays with the
//! caller.

pub mod cells;
pub mod search;

pub use cells::{cells_for, INDEX_LEVELS};
pub use search::{candidates_for_box, candidates_for_radius, CandidateSource};
