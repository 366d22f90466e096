//! Geometry, hit and seed builders shared by the integration tests

use nalgebra::{Matrix5, Point3, Vector5};

use tracker_extrapolation::common::ElementFields;
use tracker_extrapolation::{
    CellIdCodec, DetectorElementId, ExtrapolationConfig, HitCollection, HitId, StaticGeometry,
    Track, TrackState, TrackerHit,
};

//=============================================================================
// Detector
//=============================================================================

/// Subdetector id of the seed hits
pub const VERTEX_ID: u32 = 1;
/// Subdetector id of the outer barrel
pub const OUTER_BARREL_ID: u32 = 5;
/// Subdetector id of the outer endcap
pub const OUTER_ENDCAP_ID: u32 = 6;

pub const OUTER_BARREL: &str = "OuterTrackerBarrel";
pub const OUTER_ENDCAP: &str = "OuterTrackerEndcap";
pub const OUTER_BARREL_HITS: &str = "OTrackerHits";
pub const OUTER_ENDCAP_HITS: &str = "OTrackerEndcapHits";
pub const SEEDS: &str = "SeedTracks";

/// Outer barrel with two layers of 12 ladders, endcap with two disks of 8 petals
pub fn geometry() -> StaticGeometry {
    StaticGeometry::new(3.5)
        .with_barrel(OUTER_BARREL, OUTER_BARREL_ID, &[12, 12])
        .with_endcap(OUTER_ENDCAP, OUTER_ENDCAP_ID, &[8, 8])
}

/// Extrapolation through the outer barrel only
pub fn barrel_config() -> ExtrapolationConfig {
    ExtrapolationConfig::default()
        .with_input_track_collection(SEEDS)
        .with_subdetectors([(OUTER_BARREL_HITS, OUTER_BARREL)])
}

/// Extrapolation through the outer barrel, then the outer endcap
pub fn barrel_and_endcap_config() -> ExtrapolationConfig {
    ExtrapolationConfig::default()
        .with_input_track_collection(SEEDS)
        .with_subdetectors([(OUTER_BARREL_HITS, OUTER_BARREL), (OUTER_ENDCAP_HITS, OUTER_ENDCAP)])
}

//=============================================================================
// Identifiers
//=============================================================================

pub fn element(subdet: u32, layer: i64, module: i64, sensor: i64) -> DetectorElementId {
    CellIdCodec::ild()
        .element_id(&ElementFields {
            subdet: i64::from(subdet),
            side: 0,
            layer,
            module,
            sensor,
        })
        .unwrap()
}

pub fn layer_key(subdet: u32, layer: i64) -> DetectorElementId {
    CellIdCodec::ild().layer_key(i64::from(subdet), layer).unwrap()
}

//=============================================================================
// Hits and seeds
//=============================================================================

/// Hit on `element` at radius `radius`
pub fn hit_on(id: u64, element: DetectorElementId, radius: f64) -> TrackerHit {
    TrackerHit::new(HitId(id), u64::from(element.raw()), Point3::new(radius, 0.0, 10.0))
}

/// Hits collection with the standard layout
pub fn collection(hits: Vec<TrackerHit>) -> HitCollection {
    HitCollection::new(hits)
}

pub fn state(omega: f64) -> TrackState {
    TrackState::new(
        Vector5::new(0.01, 0.3, omega, 0.5, 0.2),
        Matrix5::identity() * 0.01,
        Point3::origin(),
    )
}

/// Seed with `n` vertex hits whose ids start at `first_id`
pub fn seed(omega: f64, first_id: u64, n: usize) -> Track {
    let hits = (0..n)
        .map(|i| {
            let radius = 15.0 + 10.0 * i as f64;
            hit_on(first_id + i as u64, element(VERTEX_ID, i as i64, 0, 1), radius)
        })
        .rev()
        .collect();
    Track::new(state(omega), hits)
}
