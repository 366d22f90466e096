//! Best-hit selection on a set of candidate elements
//!
//! Greedy, one hit per layer: every unused hit on the candidate elements is
//! scored by the chi-square increment it would add to the fit, and the lowest
//! positive score wins. The winner is removed from the index immediately.

use crate::common::DetectorElementId;
use crate::fitting::FitSession;

use super::hit_index::SubdetectorHits;
use super::types::TrackerHit;

/// Pick the best hit among the candidate elements and remove it from `hits`,
/// returning it with its test chi-square.
///
/// Chi-square values that are not strictly positive and finite (or that the
/// session fails to compute) are treated as invalid and never win. Ties keep
/// the first hit scanned. Returns `None` when no valid candidate exists.
pub fn select_best<S: FitSession + ?Sized>(
    candidates: &[DetectorElementId],
    hits: &mut SubdetectorHits,
    session: &mut S,
) -> Option<(TrackerHit, f64)> {
    let mut best: Option<(DetectorElementId, usize, f64)> = None;

    for &element in candidates {
        let on_element = hits.hits_on(element);
        log::trace!("Element {}: {} unused hits", element, on_element.len());

        for (position, hit) in on_element.iter().enumerate() {
            let chi2 = match session.test_chi2_increment(hit) {
                Ok(chi2) => chi2,
                Err(e) => {
                    log::trace!("Chi2 test failed for hit {:?}: {}", hit.id, e);
                    continue;
                }
            };
            log::trace!("Hit {:?}: test chi2 {}", hit.id, chi2);

            let valid = chi2 > 0.0 && chi2.is_finite();
            if valid && best.map_or(true, |(_, _, min)| chi2 < min) {
                best = Some((element, position, chi2));
            }
        }
    }

    let (element, position, chi2) = best?;
    log::trace!(
        "Selected hit at position {} on element {} with chi2 {}",
        position,
        element,
        chi2
    );
    hits.take(element, position).map(|hit| (hit, chi2))
}
