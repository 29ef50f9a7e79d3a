//! Proximity and bounding-box post queries for the presentation layer.
//!
//! Parameters are validated before any store access; invalid input yields an
//! explicit error, never a silent empty result.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use nestwatch_common::{haversine_m, Coordinate, GeoRegion, NestwatchError};
use nestwatch_geo::{candidates_for_box, candidates_for_radius, CandidateSource};

use crate::traits::Store;

/// Default freshness window for bounding-box queries, in hours.
pub const DEFAULT_FRESHNESS_HOURS: i64 = 48;

/// Adapter scoping cell-key lookups to one list's posts.
pub struct PostCandidates<'a> {
    pub store: &'a dyn Store,
    pub list_id: Uuid,
    pub created_after: Option<DateTime<Utc>>,
    pub include_approximate: bool,
}

#[async_trait]
impl CandidateSource for PostCandidates<'_> {
    async fn keys_in_cells(&self, cells: &[String]) -> Result<Vec<Uuid>> {
        self.store
            .post_ids_in_cells(
                self.list_id,
                cells,
                self.created_after,
                self.include_approximate,
            )
            .await
    }
}

#[derive(Debug, Clone)]
pub struct ProximityQuery {
    pub list_id: Uuid,
    pub region: GeoRegion,
    pub max_results: usize,
    pub include_approximate: bool,
}

#[derive(Debug, Clone)]
pub struct BoxQuery {
    pub list_id: Uuid,
    pub north: f64,
    pub east: f64,
    pub south: f64,
    pub west: f64,
    pub max_results: usize,
    pub include_approximate: bool,
    /// Only posts created within the last N hours; 0 disables the filter.
    pub freshness_hours: i64,
}

/// One query hit. `distance_m` is set for proximity queries only.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: Uuid,
    pub title: String,
    pub price: u32,
    pub location: Coordinate,
    pub distance_m: Option<f64>,
    pub created: DateTime<Utc>,
}

/// Posts within a radius of a point, most recent first.
pub async fn proximity_search(
    store: &dyn Store,
    query: &ProximityQuery,
) -> Result<Vec<SearchHit>, NestwatchError> {
    if query.max_results == 0 {
        return Err(NestwatchError::Validation(
            "max_results must be positive".to_string(),
        ));
    }

    let source = PostCandidates {
        store,
        list_id: query.list_id,
        created_after: None,
        include_approximate: query.include_approximate,
    };
    let center = query.region.center();
    let radius = query.region.radius_m() as f64;

    let keys = candidates_for_radius(&source, center, radius, query.max_results).await?;

    let mut hits = Vec::new();
    for post in store.posts_by_ids(&keys).await? {
        let distance = haversine_m(center.lat, center.lng, post.location.lat, post.location.lng);
        if distance <= radius {
            hits.push(SearchHit {
                id: post.id,
                title: post.title,
                price: post.price,
                location: post.location,
                distance_m: Some(distance.round()),
                created: post.created,
            });
        }
    }

    hits.sort_by(|a, b| b.created.cmp(&a.created));
    hits.truncate(query.max_results);
    Ok(hits)
}

/// Posts within a rectangle, most recent first.
pub async fn bounding_box_search(
    store: &dyn Store,
    query: &BoxQuery,
) -> Result<Vec<SearchHit>, NestwatchError> {
    validate_box(query)?;

    let created_after = if query.freshness_hours > 0 {
        Some(Utc::now() - Duration::hours(query.freshness_hours))
    } else {
        None
    };
    let source = PostCandidates {
        store,
        list_id: query.list_id,
        created_after,
        include_approximate: query.include_approximate,
    };

    let keys = candidates_for_box(&source, query.north, query.east, query.south, query.west).await?;

    let mut hits = Vec::new();
    for post in store.posts_by_ids(&keys).await? {
        let inside = post.location.lat <= query.north
            && post.location.lat >= query.south
            && post.location.lng <= query.east
            && post.location.lng >= query.west;
        if inside {
            hits.push(SearchHit {
                id: post.id,
                title: post.title,
                price: post.price,
                location: post.location,
                distance_m: None,
                created: post.created,
            });
        }
    }

    hits.sort_by(|a, b| b.created.cmp(&a.created));
    hits.truncate(query.max_results);
    Ok(hits)
}

fn validate_box(query: &BoxQuery) -> Result<(), NestwatchError> {
    if query.max_results == 0 {
        return Err(NestwatchError::Validation(
            "max_results must be positive".to_string(),
        ));
    }
    if query.north <= query.south {
        return Err(NestwatchError::Validation(
            "north must exceed south".to_string(),
        ));
    }
    if query.east <= query.west {
        return Err(NestwatchError::Validation(
            "east must exceed west".to_string(),
        ));
    }
    if query.north > 90.0 || query.south < -90.0 || query.east > 180.0 || query.west < -180.0 {
        return Err(NestwatchError::Validation(
            "rectangle is out of range".to_string(),
        ));
    }
    Ok(())
}
