//! Extended tracks produced by the extrapolation
//!
//! - [`ExtendedTrack`] - final fitted state, hits in fit, outliers
//! - [`HitCount`] - per-subdetector hit bookkeeping

use std::collections::BTreeMap;

use crate::common::constants::FIELD_SUBDET;
use crate::common::CellIdCodec;
use crate::fitting::WeightedHit;

use super::types::{TrackState, TrackerHit};

/// Hits a track has on one subdetector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitCount {
    /// Hits used in the fit
    pub in_fit: usize,
    /// Hits used in the fit plus outliers
    pub total: usize,
}

/// A seed track after extrapolation and fit
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedTrack {
    /// Position of the seed in the input collection
    pub seed_index: usize,
    /// Final fitted state
    pub state: TrackState,
    /// Total chi-square
    pub chi2: f64,
    /// Degrees of freedom
    pub ndf: i32,
    /// Hits in the fit with their chi-square contributions, in fit order
    pub hits_in_fit: Vec<WeightedHit>,
    /// Hits tested but excluded from the fit
    pub outliers: Vec<WeightedHit>,
    /// Hits added by the extrapolation (not part of the seed)
    pub added_hits: usize,
    /// Hit counts keyed by subdetector id
    pub subdetector_hits: BTreeMap<u32, HitCount>,
    /// Bit `n` is set when subdetector `n` contributes a hit to the fit
    pub type_bits: u32,
}

impl ExtendedTrack {
    /// Hits in the fit, in fit order
    pub fn hits(&self) -> impl Iterator<Item = &TrackerHit> {
        self.hits_in_fit.iter().map(|(hit, _)| hit)
    }

    /// Number of hits in the fit
    #[inline]
    pub fn num_hits_in_fit(&self) -> usize {
        self.hits_in_fit.len()
    }

    /// Chi-square per degree of freedom (infinite when `ndf <= 0`)
    pub fn reduced_chi2(&self) -> f64 {
        if self.ndf > 0 {
            self.chi2 / self.ndf as f64
        } else {
            f64::INFINITY
        }
    }

    /// Hit counts on a subdetector
    pub fn hit_count(&self, subdet: u32) -> HitCount {
        self.subdetector_hits.get(&subdet).copied().unwrap_or_default()
    }

    /// Whether the subdetector's type bit is set
    #[inline]
    pub fn has_subdetector(&self, subdet: u32) -> bool {
        subdet < u32::BITS && self.type_bits & (1 << subdet) != 0
    }
}

/// Count hits per subdetector and derive the type bits.
///
/// The subdetector is read from each hit's cell identifier with the standard
/// layout. Only hits in the fit set type bits.
pub fn subdetector_hit_numbers(
    hits_in_fit: &[WeightedHit],
    outliers: &[WeightedHit],
) -> (BTreeMap<u32, HitCount>, u32) {
    let codec = CellIdCodec::ild();
    let subdet_of = |hit: &TrackerHit| {
        codec
            .value(hit.cell_id, FIELD_SUBDET)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
    };

    let mut counts: BTreeMap<u32, HitCount> = BTreeMap::new();
    for (hit, _) in hits_in_fit {
        if let Some(subdet) = subdet_of(hit) {
            let count = counts.entry(subdet).or_default();
            count.in_fit += 1;
            count.total += 1;
        }
    }
    for (hit, _) in outliers {
        if let Some(subdet) = subdet_of(hit) {
            counts.entry(subdet).or_default().total += 1;
        }
    }

    let type_bits = counts
        .iter()
        .filter(|(subdet, count)| count.in_fit > 0 && **subdet < u32::BITS)
        .fold(0u32, |bits, (&subdet, _)| bits | (1 << subdet));

    (counts, type_bits)
}
