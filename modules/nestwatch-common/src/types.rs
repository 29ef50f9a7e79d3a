use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NestwatchError;

// --- Geo types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Haversine great-circle distance between two lat/lng points in meters.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// A validated center-plus-radius watch region.
///
/// Constructed only through [`GeoRegion::new`], so a region in a stored
/// filter always carries an in-range center and a positive radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRegion {
    center: Coordinate,
    radius_m: u32,
}

impl GeoRegion {
    pub const DEFAULT_RADIUS_M: u32 = 2500;

    pub fn new(center: Coordinate, radius_m: u32) -> Result<Self, NestwatchError> {
        if !center.is_valid() {
            return Err(NestwatchError::Validation(format!(
                "center ({}, {}) is out of range",
                center.lat, center.lng
            )));
        }
        if radius_m == 0 {
            return Err(NestwatchError::Validation(
                "radius must be positive".to_string(),
            ));
        }
        Ok(Self { center, radius_m })
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn radius_m(&self) -> u32 {
        self.radius_m
    }
}

// --- Identity ---

/// An explicit acting-user identity. Operations that need authorization take
/// one of these; there is no ambient session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub user_id: String,
    pub email: String,
    pub nickname: String,
}

// --- Entities ---

/// Lower quartile, median and upper quartile of one sync run's prices.
/// All zero until the first aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceStats {
    pub lower_quartile: u32,
    pub median: u32,
    pub upper_quartile: u32,
}

/// A monitored (city, category) feed. The ingestion stage is the only writer
/// of `last_synced`, and it only ever moves forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: Uuid,
    pub city: String,
    pub state: String,
    pub category: String,
    pub aggregated_prices: PriceStats,
    pub last_synced: DateTime<Utc>,
}

impl List {
    pub fn new(city: &str, state: &str, category: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            city: city.to_string(),
            state: state.to_string(),
            category: category.to_string(),
            aggregated_prices: PriceStats::default(),
            last_synced: DateTime::UNIX_EPOCH,
        }
    }
}

/// One ingested, geocoded ad. Never persisted without a resolved location;
/// `cells` is the geocell set computed at indexing time. (list_id, link) is
/// the idempotency key enforced by `Store::insert_post`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub list_id: Uuid,
    pub link: String,
    pub title: String,
    pub description: String,
    pub price: u32,
    pub created: DateTime<Utc>,
    pub location: Coordinate,
    /// True when geocoding resolved only a political-boundary match.
    pub approx_location: bool,
    pub cells: Vec<String>,
}

/// (List, user) subscription pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSubscriber {
    pub id: Uuid,
    pub list_id: Uuid,
    pub user: UserRef,
}

/// A user's saved geo+price watch against a list. Re-saving replaces the
/// region, price cap and label; only user actions create or change one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertFilter {
    pub id: Uuid,
    pub list_id: Uuid,
    pub owner: UserRef,
    pub region: GeoRegion,
    /// 0 means unbounded.
    pub max_price: u32,
    pub street_label: String,
}

// --- Entity kinds ---

/// Explicit kind selector for wire packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    List,
    Post,
}

impl EntityKind {
    /// Case-insensitive kind lookup for wire requests.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "list" => Some(EntityKind::List),
            "post" => Some(EntityKind::Post),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::List => write!(f, "list"),
            EntityKind::Post => write!(f, "post"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_minneapolis_to_st_paul() {
        // Downtown Minneapolis to downtown St. Paul is ~14.5km
        let dist = haversine_m(44.9778, -93.2650, 44.9537, -93.0900);
        assert!(
            (dist - 14_000.0).abs() < 1_500.0,
            "Minneapolis to St. Paul should be ~14km, got {dist}"
        );
    }

    #[test]
    fn haversine_same_point_is_zero() {
        let dist = haversine_m(44.9778, -93.265, 44.9778, -93.265);
        assert!(dist < 1.0, "Same point should be 0m, got {dist}");
    }

    #[test]
    fn haversine_small_offset() {
        // One degree of latitude is ~111.2km
        let dist = haversine_m(44.0, -93.0, 45.0, -93.0);
        assert!(
            (dist - 111_200.0).abs() < 1_000.0,
            "One degree of latitude should be ~111km, got {dist}"
        );
    }

    #[test]
    fn region_rejects_out_of_range_center() {
        let center = Coordinate { lat: 95.0, lng: 0.0 };
        assert!(GeoRegion::new(center, 2500).is_err());
    }

    #[test]
    fn region_rejects_zero_radius() {
        let center = Coordinate { lat: 44.9778, lng: -93.2650 };
        assert!(GeoRegion::new(center, 0).is_err());
    }

    #[test]
    fn region_exposes_center_and_radius() {
        let center = Coordinate { lat: 44.9778, lng: -93.2650 };
        let region = GeoRegion::new(center, GeoRegion::DEFAULT_RADIUS_M).unwrap();
        assert_eq!(region.center(), center);
        assert_eq!(region.radius_m(), 2500);
    }

    #[test]
    fn new_list_starts_at_epoch_with_zero_stats() {
        let list = List::new("minneapolis", "MN", "roo");
        assert_eq!(list.last_synced, DateTime::UNIX_EPOCH);
        assert_eq!(list.aggregated_prices, PriceStats::default());
    }

    #[test]
    fn entity_kind_parses_loosely() {
        assert_eq!(EntityKind::parse("Post"), Some(EntityKind::Post));
        assert_eq!(EntityKind::parse("LIST"), Some(EntityKind::List));
        assert_eq!(EntityKind::parse("favorite"), None);
    }
}
