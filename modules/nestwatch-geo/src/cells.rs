//! Geocell encoding and covering-set computation.

use geohash::Coord;

use nestwatch_common::Coordinate;

/// Geohash precisions stored per entity, coarsest to finest.
/// Level 3 cells are ~156km across; level 7 cells are ~150m.
pub const INDEX_LEVELS: &[usize] = &[3, 4, 5, 6, 7];

/// Meters per degree of latitude.
const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Cap on the number of cells a bounding-box covering should produce when
/// picking a resolution level.
const MAX_COVERING_CELLS: usize = 64;

/// Geocell identifiers for a coordinate, one per resolution level, coarsest
/// to finest. Deterministic for a given coordinate; out-of-range coordinates
/// yield an empty set rather than an error.
pub fn cells_for(coord: Coordinate, levels: &[usize]) -> Vec<String> {
    levels
        .iter()
        .filter_map(|&len| {
            geohash::encode(
                Coord {
                    x: coord.lng,
                    y: coord.lat,
                },
                len,
            )
            .ok()
        })
        .collect()
}

/// Width and height of one cell in degrees at the given precision level.
fn cell_span_deg(level: usize) -> (f64, f64) {
    let bits = 5 * level;
    let lng_bits = (bits + 1) / 2;
    let lat_bits = bits / 2;
    (
        360.0 / (1u64 << lng_bits) as f64,
        180.0 / (1u64 << lat_bits) as f64,
    )
}

/// Smallest metric dimension of a cell at `level`, at latitude `lat`.
/// Cell width in meters shrinks with latitude; a floor on the cosine keeps
/// the value sane near the poles.
fn min_cell_dim_m(level: usize, lat: f64) -> f64 {
    let (lng_deg, lat_deg) = cell_span_deg(level);
    let height = lat_deg * METERS_PER_DEG_LAT;
    let width = lng_deg * METERS_PER_DEG_LAT * lat.to_radians().cos().abs().max(0.01);
    height.min(width)
}

/// Finest indexed level whose cells still span `radius_m`, so the cell ring
/// around the center is a superset of the radius. Falls back to the coarsest
/// indexed level for radii larger than any cell.
pub(crate) fn level_for_radius(radius_m: f64, lat: f64) -> usize {
    INDEX_LEVELS
        .iter()
        .rev()
        .copied()
        .find(|&level| min_cell_dim_m(level, lat) >= radius_m)
        .unwrap_or(INDEX_LEVELS[0])
}

/// Finest indexed level that keeps the box covering under the cell cap.
pub(crate) fn level_for_box(north: f64, east: f64, south: f64, west: f64) -> usize {
    INDEX_LEVELS
        .iter()
        .rev()
        .copied()
        .find(|&level| {
            let (lng_deg, lat_deg) = cell_span_deg(level);
            let cols = ((east - west) / lng_deg).ceil() as usize + 1;
            let rows = ((north - south) / lat_deg).ceil() as usize + 1;
            cols * rows <= MAX_COVERING_CELLS
        })
        .unwrap_or(INDEX_LEVELS[0])
}

/// Cells overlapping the rectangle at `level`, found by stepping the
/// rectangle in cell-span increments from the southwest corner. Consecutive
/// samples are exactly one span apart, so every intersected cell row and
/// column receives at least one sample.
pub(crate) fn covering_cells(
    north: f64,
    east: f64,
    south: f64,
    west: f64,
    level: usize,
) -> Vec<String> {
    let (lng_span, lat_span) = cell_span_deg(level);
    let mut out = Vec::new();

    let mut lat = south;
    loop {
        let mut lng = west;
        loop {
            let sample = Coord {
                x: lng.min(east),
                y: lat.min(north),
            };
            if let Ok(cell) = geohash::encode(sample, level) {
                if !out.contains(&cell) {
                    out.push(cell);
                }
            }
            if lng >= east {
                break;
            }
            lng += lng_span;
        }
        if lat >= north {
            break;
        }
        lat += lat_span;
    }
    out
}

/// The center's cell plus its 8-neighbor ring at `level`. Empty for
/// out-of-range centers.
pub(crate) fn ring(center: Coordinate, level: usize) -> Vec<String> {
    let center_cell = match geohash::encode(
        Coord {
            x: center.lng,
            y: center.lat,
        },
        level,
    ) {
        Ok(cell) => cell,
        Err(_) => return Vec::new(),
    };

    let mut cells = vec![center_cell.clone()];
    if let Ok(n) = geohash::neighbors(&center_cell) {
        cells.extend([n.n, n.ne, n.e, n.se, n.s, n.sw, n.w, n.nw]);
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINNEAPOLIS: Coordinate = Coordinate {
        lat: 44.9778,
        lng: -93.2650,
    };

    #[test]
    fn cells_are_coarse_to_fine_prefixes() {
        let cells = cells_for(MINNEAPOLIS, INDEX_LEVELS);
        assert_eq!(cells.len(), INDEX_LEVELS.len());
        for (cell, &level) in cells.iter().zip(INDEX_LEVELS) {
            assert_eq!(cell.len(), level);
        }
        // Finer cells refine coarser ones
        for pair in cells.windows(2) {
            assert!(pair[1].starts_with(&pair[0]));
        }
    }

    #[test]
    fn cells_deterministic() {
        assert_eq!(
            cells_for(MINNEAPOLIS, INDEX_LEVELS),
            cells_for(MINNEAPOLIS, INDEX_LEVELS)
        );
    }

    #[test]
    fn out_of_range_coordinate_yields_no_cells() {
        let bogus = Coordinate {
            lat: 95.0,
            lng: -300.0,
        };
        assert!(cells_for(bogus, INDEX_LEVELS).is_empty());
    }

    #[test]
    fn radius_level_matches_cell_size() {
        // 2.5km fits level-5 cells (~4.9km) but not level-6 (~610m)
        assert_eq!(level_for_radius(2500.0, 44.98), 5);
        // 100m fits level-7 cells (~150m)
        assert_eq!(level_for_radius(100.0, 44.98), 7);
        // Huge radii fall back to the coarsest indexed level
        assert_eq!(level_for_radius(500_000.0, 44.98), 3);
    }

    #[test]
    fn ring_has_center_and_eight_neighbors() {
        let cells = ring(MINNEAPOLIS, 5);
        assert_eq!(cells.len(), 9);
        let unique: std::collections::HashSet<_> = cells.iter().collect();
        assert_eq!(unique.len(), 9);
    }

    #[test]
    fn ring_empty_for_invalid_center() {
        let bogus = Coordinate {
            lat: 200.0,
            lng: 0.0,
        };
        assert!(ring(bogus, 5).is_empty());
    }

    #[test]
    fn covering_includes_all_corner_cells() {
        // A box roughly over the Twin Cities metro
        let cells = covering_cells(45.1, -92.9, 44.8, -93.4, 5);
        for corner in [
            Coordinate { lat: 44.8, lng: -93.4 },
            Coordinate { lat: 44.8, lng: -92.9 },
            Coordinate { lat: 45.1, lng: -93.4 },
            Coordinate { lat: 45.1, lng: -92.9 },
        ] {
            let cell = cells_for(corner, &[5]).remove(0);
            assert!(cells.contains(&cell), "missing corner cell {cell}");
        }
    }

    #[test]
    fn box_level_respects_cell_cap() {
        let level = level_for_box(45.1, -92.9, 44.8, -93.4);
        let cells = covering_cells(45.1, -92.9, 44.8, -93.4, level);
        assert!(!cells.is_empty());
        assert!(cells.len() <= 64, "covering too large: {}", cells.len());
    }
}
