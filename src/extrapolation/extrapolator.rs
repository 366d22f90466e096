//! Single-track extrapolation
//!
//! [`TrackExtrapolator`] owns one fit session per seed and drives the
//! propagate → search → select → fit loop over every configured layer:
//!
//! 1. Seed hits are loaded innermost first and fitted.
//! 2. For each subdetector and layer, the state is propagated to the layer,
//!    the struck element and its neighbours are searched, and the best hit is
//!    offered to the fit with the configured chi-square cut.
//! 3. Optionally the collected hits are refitted from the outside in.
//! 4. The track is kept only with at least [`MIN_HITS_IN_FIT`] hits in the fit.

use crate::common::constants::MIN_HITS_IN_FIT;
use crate::common::CellIdCodec;
use crate::fitting::{FitDirection, FitSession, FitSystem, PropagationMode};
use crate::geometry::GeometryCatalog;
use crate::reporter::ExtrapolationReporter;

use super::config::ExtrapolationConfig;
use super::errors::TrackDiscard;
use super::hit_index::HitIndex;
use super::neighbors::neighbours;
use super::output::{subdetector_hit_numbers, ExtendedTrack};
use super::selector::select_best;
use super::types::{sort_by_radius, Track, TrackState, TrackerHit, D0, Z0};

/// Expected search distances around a propagated state.
///
/// Only reported; the hit selection is not restricted to this window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchWindow {
    /// Distance in the bending plane
    pub rphi: f64,
    /// Distance along the beam axis
    pub z: f64,
}

impl SearchWindow {
    /// `search_sigma` standard deviations of `d0` and `z0`
    pub fn around(state: &TrackState, search_sigma: f64) -> Self {
        Self {
            rphi: search_sigma * state.sigma(D0),
            z: search_sigma * state.sigma(Z0),
        }
    }
}

/// Per-track bookkeeping filled in during extrapolation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackTally {
    /// Hits picked by the selector
    pub considered: usize,
    /// Picked hits accepted by the fit
    pub fitted: usize,
    /// Picked hits refused by the fit
    pub rejected: usize,
    /// Every hit removed from the index for this track, in selection order
    pub taken: Vec<TrackerHit>,
}

/// Extends one seed track at a time through the configured subdetectors.
pub struct TrackExtrapolator<'a, F: FitSystem> {
    fit_system: &'a F,
    catalog: &'a GeometryCatalog,
    config: &'a ExtrapolationConfig,
    codec: CellIdCodec,
}

impl<'a, F: FitSystem> TrackExtrapolator<'a, F> {
    /// Create an extrapolator for the current run
    pub fn new(fit_system: &'a F, catalog: &'a GeometryCatalog, config: &'a ExtrapolationConfig) -> Self {
        Self {
            fit_system,
            catalog,
            config,
            codec: CellIdCodec::ild(),
        }
    }

    /// Extrapolate one seed track, consuming hits from `index`.
    ///
    /// Hits are removed from the index as soon as they are selected, whether
    /// or not the fit accepts them and whether or not the track survives.
    pub fn extrapolate<R: ExtrapolationReporter + ?Sized>(
        &self,
        seed_index: usize,
        seed: &Track,
        index: &mut HitIndex,
        tally: &mut TrackTally,
        reporter: &mut R,
    ) -> Result<ExtendedTrack, TrackDiscard> {
        reporter.on_track_start(seed_index, seed);

        let mut hits = seed.hits.clone();
        sort_by_radius(&mut hits);
        let mut session = self.seed_session(&hits, &seed.state, FitDirection::Forward)?;
        session
            .fit(f64::INFINITY)
            .map_err(TrackDiscard::InitialFit)?;

        let mut struck = false;
        let mut added_hits = 0;

        for (subdetector, layout) in self.catalog.subdetectors().iter().enumerate() {
            if layout.num_layers() == 0 {
                continue;
            }
            let Some(subdetector_hits) = index.subdetector_mut(subdetector) else {
                log::trace!("No hits for subdetector {} in this event", layout.name);
                continue;
            };

            for layer in 0..layout.num_layers() {
                let layer_id = match self.codec.layer_key(i64::from(layout.id), layer as i64) {
                    Ok(id) => id,
                    Err(e) => {
                        log::debug!("Cannot encode {} layer {}: {}", layout.name, layer, e);
                        continue;
                    }
                };

                let propagation = match session.propagate_to_layer(layer_id, PropagationMode::Closest) {
                    Ok(propagation) => propagation,
                    Err(e) => {
                        log::trace!("Seed {}: no propagation to {} layer {}: {}", seed_index, layout.name, layer, e);
                        continue;
                    }
                };
                let window = SearchWindow::around(&propagation.state, self.config.search_sigma);
                reporter.on_layer_propagated(&layout.name, layer, &propagation, &window);

                if !propagation.element_id.is_valid() {
                    continue;
                }
                struck = true;

                let candidates = neighbours(
                    propagation.element_id,
                    subdetector_hits.codec(),
                    &layout.modules_per_layer,
                );
                let Some((hit, test_chi2)) = select_best(&candidates, subdetector_hits, &mut session)
                else {
                    continue;
                };
                reporter.on_hit_selected(&hit, test_chi2);
                tally.considered += 1;
                tally.taken.push(hit);

                match session.add_and_fit(&hit, self.config.max_chi2_increment) {
                    Ok(chi2_increment) => {
                        tally.fitted += 1;
                        added_hits += 1;
                        hits.push(hit);
                        reporter.on_hit_accepted(&hit, chi2_increment);
                    }
                    Err(e) => {
                        tally.rejected += 1;
                        reporter.on_hit_rejected(&hit, &e);
                    }
                }
            }
        }

        if self.config.perform_final_refit && struck {
            let refit = self.refit(&mut hits, &session)?;
            self.finalize(seed_index, &refit, added_hits)
        } else {
            if self.config.perform_final_refit {
                log::debug!("Seed {}: no element struck, keeping the extrapolation fit", seed_index);
            }
            self.finalize(seed_index, &session, added_hits)
        }
    }

    /// New session holding `hits` (already ordered), initialised from `state`.
    fn seed_session(
        &self,
        hits: &[TrackerHit],
        state: &TrackState,
        direction: FitDirection,
    ) -> Result<F::Session, TrackDiscard> {
        let mut session = self.fit_system.create_session();
        for hit in hits {
            if let Err(e) = session.add_hit(hit) {
                log::debug!("Hit {:?} not added to session: {}", hit.id, e);
            }
        }
        session
            .initialise(state, self.catalog.b_field(), direction)
            .map_err(TrackDiscard::Initialisation)?;
        Ok(session)
    }

    /// Fit the working hits again, outside in, starting from the extrapolated state.
    fn refit(&self, hits: &mut [TrackerHit], session: &F::Session) -> Result<F::Session, TrackDiscard> {
        let state = session.track_state().map_err(TrackDiscard::Refit)?.state;
        sort_by_radius(hits);

        let mut refit = self.fit_system.create_session();
        for hit in hits.iter() {
            if let Err(e) = refit.add_hit(hit) {
                log::debug!("Hit {:?} not added to refit: {}", hit.id, e);
            }
        }
        refit
            .initialise(&state, self.catalog.b_field(), FitDirection::Backward)
            .map_err(TrackDiscard::Refit)?;
        refit
            .fit(self.config.max_chi2_increment)
            .map_err(TrackDiscard::Refit)?;
        Ok(refit)
    }

    fn finalize<S: FitSession>(
        &self,
        seed_index: usize,
        session: &S,
        added_hits: usize,
    ) -> Result<ExtendedTrack, TrackDiscard> {
        let hits_in_fit = session.hits_in_fit();
        if hits_in_fit.len() < MIN_HITS_IN_FIT {
            return Err(TrackDiscard::TooFewHits {
                hits_in_fit: hits_in_fit.len(),
                required: MIN_HITS_IN_FIT,
            });
        }
        let outliers = session.outliers();
        let fitted = session.track_state().map_err(TrackDiscard::Finalisation)?;
        let (subdetector_hits, type_bits) = subdetector_hit_numbers(&hits_in_fit, &outliers);

        Ok(ExtendedTrack {
            seed_index,
            state: fitted.state,
            chi2: fitted.chi2,
            ndf: fitted.ndf,
            hits_in_fit,
            outliers,
            added_hits,
            subdetector_hits,
            type_bits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix5, Point3, Vector5};

    #[test]
    fn test_search_window() {
        let mut covariance = Matrix5::identity();
        covariance[(D0, D0)] = 0.04;
        covariance[(Z0, Z0)] = 0.25;
        let state = TrackState::new(Vector5::zeros(), covariance, Point3::origin());

        let window = SearchWindow::around(&state, 3.0);
        assert!((window.rphi - 0.6).abs() < 1e-12);
        assert!((window.z - 1.5).abs() < 1e-12);
    }
}
