//! Proximity and bounding-box candidate lookup.
//!
//! Both queries return a *superset* of matching entity keys; exact haversine
//! or containment filtering is the caller's responsibility.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use nestwatch_common::Coordinate;

use crate::cells::{covering_cells, level_for_box, level_for_radius, ring, INDEX_LEVELS};

/// Cell-indexed key lookup, implemented by the store. An empty index yields
/// an empty key list, never an error.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Keys of entities indexed under any of the given cells.
    async fn keys_in_cells(&self, cells: &[String]) -> Result<Vec<Uuid>>;
}

/// Candidate keys for a radius query.
///
/// Starts at the finest indexed level whose cell size covers the radius and
/// queries the center cell plus its 8-neighbor ring; while fewer than
/// `min_results` keys are found, falls back one level coarser, bounded by
/// the resolution ladder.
pub async fn candidates_for_radius(
    source: &dyn CandidateSource,
    center: Coordinate,
    radius_m: f64,
    min_results: usize,
) -> Result<Vec<Uuid>> {
    let start = level_for_radius(radius_m, center.lat);
    let start_idx = INDEX_LEVELS
        .iter()
        .position(|&l| l == start)
        .unwrap_or(0);

    let mut keys = Vec::new();
    for idx in (0..=start_idx).rev() {
        let cells = ring(center, INDEX_LEVELS[idx]);
        if cells.is_empty() {
            // Out-of-range center; nothing can be indexed there.
            return Ok(Vec::new());
        }
        keys = source.keys_in_cells(&cells).await?;
        if keys.len() >= min_results {
            break;
        }
    }
    Ok(keys)
}

/// Candidate keys for a bounding-box query, via the covering cell set at the
/// finest level that keeps the covering small.
pub async fn candidates_for_box(
    source: &dyn CandidateSource,
    north: f64,
    east: f64,
    south: f64,
    west: f64,
) -> Result<Vec<Uuid>> {
    let level = level_for_box(north, east, south, west);
    let cells = covering_cells(north, east, south, west, level);
    if cells.is_empty() {
        return Ok(Vec::new());
    }
    source.keys_in_cells(&cells).await
}
