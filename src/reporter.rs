//! Observability for extrapolation runs.
//!
//! This module provides the [`ExtrapolationReporter`] trait for debugging and
//! diagnostics. Reporters receive callbacks at key points of the
//! propagate/search/fit loop without cluttering the algorithm itself.
//!
//! - [`NoOpReporter`] - does nothing, compiles away
//! - [`LoggingReporter`] - emits `log` records (the driver's default)
//! - [`DebugReporter`] - records everything for later inspection
//! - [`CompositeReporter`] - forwards to two reporters

use crate::common::DetectorElementId;
use crate::extrapolation::errors::TrackDiscard;
use crate::extrapolation::extrapolator::SearchWindow;
use crate::extrapolation::output::ExtendedTrack;
use crate::extrapolation::types::{HitId, Track, TrackerHit};
use crate::fitting::{FitError, Propagation};

// ============================================================================
// ExtrapolationReporter Trait
// ============================================================================

/// Observability hooks for the extrapolation.
///
/// All methods have empty default implementations; override the ones you need.
/// Callbacks receive references; clone inside the callback to keep data.
pub trait ExtrapolationReporter {
    /// Called before the tracks of an event are processed
    fn on_event_start(&mut self, _event_number: u64, _num_tracks: usize) {}

    /// Called when extrapolation of a seed track begins
    fn on_track_start(&mut self, _seed_index: usize, _track: &Track) {}

    /// Called after a successful propagation to a layer
    fn on_layer_propagated(
        &mut self,
        _subdetector: &str,
        _layer: usize,
        _propagation: &Propagation,
        _window: &SearchWindow,
    ) {
    }

    /// Called when the selector picks a hit (already removed from the index)
    fn on_hit_selected(&mut self, _hit: &TrackerHit, _chi2_increment: f64) {}

    /// Called when a selected hit is added to the fit
    fn on_hit_accepted(&mut self, _hit: &TrackerHit, _chi2_increment: f64) {}

    /// Called when a selected hit fails the chi-square cut or the fit
    fn on_hit_rejected(&mut self, _hit: &TrackerHit, _error: &FitError) {}

    /// Called when a track is written to the output
    fn on_track_finalized(&mut self, _track: &ExtendedTrack) {}

    /// Called when a track is dropped
    fn on_track_discarded(&mut self, _seed_index: usize, _reason: &TrackDiscard) {}

    /// Called after all tracks of an event are processed
    fn on_event_complete(&mut self, _tracks: &[ExtendedTrack], _leftover_hits: usize) {}
}

// ============================================================================
// NoOpReporter
// ============================================================================

/// Reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl NoOpReporter {
    /// Create a new no-op reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ExtrapolationReporter for NoOpReporter {}

// ============================================================================
// LoggingReporter
// ============================================================================

/// Reporter that logs through the `log` crate.
///
/// Levels:
/// - event start/complete: INFO
/// - track finalized/discarded, hit accepted/rejected: DEBUG
/// - track start, layer propagation and search window: TRACE
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReporter {
    verbose: bool,
}

impl LoggingReporter {
    /// Create a new logging reporter.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Create a verbose reporter that also logs per-hit details of outputs.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl ExtrapolationReporter for LoggingReporter {
    fn on_event_start(&mut self, event_number: u64, num_tracks: usize) {
        log::info!("Event {}: {} seed tracks", event_number, num_tracks);
    }

    fn on_track_start(&mut self, seed_index: usize, track: &Track) {
        log::trace!(
            "Seed {}: omega={:.6e}, {} hits",
            seed_index,
            track.state.omega(),
            track.hits.len()
        );
    }

    fn on_layer_propagated(
        &mut self,
        subdetector: &str,
        layer: usize,
        propagation: &Propagation,
        window: &SearchWindow,
    ) {
        let state = &propagation.state;
        log::trace!(
            "{} layer {}: element {}, chi2/ndf {}/{}, d0={:.4} phi={:.4} omega={:.4e} z0={:.4} tanL={:.4}",
            subdetector,
            layer,
            propagation.element_id,
            propagation.chi2,
            propagation.ndf,
            state.d0(),
            state.phi(),
            state.omega(),
            state.z0(),
            state.tan_lambda()
        );
        log::trace!(
            "{} layer {}: max search distances z {:.4} : rphi {:.4}",
            subdetector,
            layer,
            window.z,
            window.rphi
        );
    }

    fn on_hit_selected(&mut self, hit: &TrackerHit, chi2_increment: f64) {
        log::trace!(
            "Selected hit {:?} on element {}, test chi2 {:.3}",
            hit.id,
            hit.element_id(),
            chi2_increment
        );
    }

    fn on_hit_accepted(&mut self, hit: &TrackerHit, chi2_increment: f64) {
        log::debug!(
            "Hit {:?} added on element {}, chi2 increment {:.3}",
            hit.id,
            hit.element_id(),
            chi2_increment
        );
    }

    fn on_hit_rejected(&mut self, hit: &TrackerHit, error: &FitError) {
        log::debug!("Hit {:?} not added: {}", hit.id, error);
    }

    fn on_track_finalized(&mut self, track: &ExtendedTrack) {
        log::debug!(
            "Seed {} extended: {} hits in fit ({} added), {} outliers, chi2/ndf {:.2}/{}",
            track.seed_index,
            track.num_hits_in_fit(),
            track.added_hits,
            track.outliers.len(),
            track.chi2,
            track.ndf
        );
        if self.verbose {
            for (subdet, count) in &track.subdetector_hits {
                log::debug!(
                    "  subdetector {}: {} in fit, {} total",
                    subdet,
                    count.in_fit,
                    count.total
                );
            }
        }
    }

    fn on_track_discarded(&mut self, seed_index: usize, reason: &TrackDiscard) {
        log::debug!("Seed {} discarded: {}", seed_index, reason);
    }

    fn on_event_complete(&mut self, tracks: &[ExtendedTrack], leftover_hits: usize) {
        log::info!(
            "Event complete: {} extended tracks, {} unused hits",
            tracks.len(),
            leftover_hits
        );
    }
}

// ============================================================================
// DebugReporter
// ============================================================================

/// Reporter that records every callback for later inspection.
#[derive(Debug, Clone, Default)]
pub struct DebugReporter {
    events: Vec<u64>,
    propagations: Vec<(String, usize, DetectorElementId)>,
    selected: Vec<HitId>,
    accepted: Vec<(HitId, f64)>,
    rejected: Vec<HitId>,
    finalized: Vec<usize>,
    discarded: Vec<(usize, TrackDiscard)>,
}

impl DebugReporter {
    /// Create a new debug reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all captured data.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Event numbers seen
    pub fn events(&self) -> &[u64] {
        &self.events
    }

    /// `(subdetector, layer, struck element)` per successful propagation
    pub fn propagations(&self) -> &[(String, usize, DetectorElementId)] {
        &self.propagations
    }

    /// Hits picked by the selector, accepted or not
    pub fn selected_hits(&self) -> &[HitId] {
        &self.selected
    }

    /// Hits added to fits, with their chi-square increments
    pub fn accepted_hits(&self) -> &[(HitId, f64)] {
        &self.accepted
    }

    /// Hits refused by the fit
    pub fn rejected_hits(&self) -> &[HitId] {
        &self.rejected
    }

    /// Seed indices of finalized tracks, in output order
    pub fn finalized(&self) -> &[usize] {
        &self.finalized
    }

    /// Seed indices of discarded tracks with the reason
    pub fn discarded(&self) -> &[(usize, TrackDiscard)] {
        &self.discarded
    }
}

impl ExtrapolationReporter for DebugReporter {
    fn on_event_start(&mut self, event_number: u64, _num_tracks: usize) {
        self.events.push(event_number);
    }

    fn on_layer_propagated(
        &mut self,
        subdetector: &str,
        layer: usize,
        propagation: &Propagation,
        _window: &SearchWindow,
    ) {
        self.propagations
            .push((subdetector.to_string(), layer, propagation.element_id));
    }

    fn on_hit_selected(&mut self, hit: &TrackerHit, _chi2_increment: f64) {
        self.selected.push(hit.id);
    }

    fn on_hit_accepted(&mut self, hit: &TrackerHit, chi2_increment: f64) {
        self.accepted.push((hit.id, chi2_increment));
    }

    fn on_hit_rejected(&mut self, hit: &TrackerHit, _error: &FitError) {
        self.rejected.push(hit.id);
    }

    fn on_track_finalized(&mut self, track: &ExtendedTrack) {
        self.finalized.push(track.seed_index);
    }

    fn on_track_discarded(&mut self, seed_index: usize, reason: &TrackDiscard) {
        self.discarded.push((seed_index, reason.clone()));
    }
}

// ============================================================================
// CompositeReporter
// ============================================================================

/// Reporter that forwards every callback to two reporters.
#[derive(Debug, Clone, Default)]
pub struct CompositeReporter<A: ExtrapolationReporter, B: ExtrapolationReporter> {
    first: A,
    second: B,
}

impl<A: ExtrapolationReporter, B: ExtrapolationReporter> CompositeReporter<A, B> {
    /// Create a new composite reporter.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// The first reporter
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The second reporter
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Consume and return both reporters.
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: ExtrapolationReporter, B: ExtrapolationReporter> ExtrapolationReporter
    for CompositeReporter<A, B>
{
    fn on_event_start(&mut self, event_number: u64, num_tracks: usize) {
        self.first.on_event_start(event_number, num_tracks);
        self.second.on_event_start(event_number, num_tracks);
    }

    fn on_track_start(&mut self, seed_index: usize, track: &Track) {
        self.first.on_track_start(seed_index, track);
        self.second.on_track_start(seed_index, track);
    }

    fn on_layer_propagated(
        &mut self,
        subdetector: &str,
        layer: usize,
        propagation: &Propagation,
        window: &SearchWindow,
    ) {
        self.first
            .on_layer_propagated(subdetector, layer, propagation, window);
        self.second
            .on_layer_propagated(subdetector, layer, propagation, window);
    }

    fn on_hit_selected(&mut self, hit: &TrackerHit, chi2_increment: f64) {
        self.first.on_hit_selected(hit, chi2_increment);
        self.second.on_hit_selected(hit, chi2_increment);
    }

    fn on_hit_accepted(&mut self, hit: &TrackerHit, chi2_increment: f64) {
        self.first.on_hit_accepted(hit, chi2_increment);
        self.second.on_hit_accepted(hit, chi2_increment);
    }

    fn on_hit_rejected(&mut self, hit: &TrackerHit, error: &FitError) {
        self.first.on_hit_rejected(hit, error);
        self.second.on_hit_rejected(hit, error);
    }

    fn on_track_finalized(&mut self, track: &ExtendedTrack) {
        self.first.on_track_finalized(track);
        self.second.on_track_finalized(track);
    }

    fn on_track_discarded(&mut self, seed_index: usize, reason: &TrackDiscard) {
        self.first.on_track_discarded(seed_index, reason);
        self.second.on_track_discarded(seed_index, reason);
    }

    fn on_event_complete(&mut self, tracks: &[ExtendedTrack], leftover_hits: usize) {
        self.first.on_event_complete(tracks, leftover_hits);
        self.second.on_event_complete(tracks, leftover_hits);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn hit(id: u64) -> TrackerHit {
        TrackerHit::new(HitId(id), 1, Point3::new(1.0, 0.0, 0.0))
    }

    #[test]
    fn test_noop_reporter() {
        let mut reporter = NoOpReporter::new();
        reporter.on_event_start(0, 0);
        reporter.on_hit_accepted(&hit(0), 1.0);
        reporter.on_event_complete(&[], 0);
    }

    #[test]
    fn test_debug_reporter_captures_events() {
        let mut reporter = DebugReporter::new();
        reporter.on_event_start(4, 2);
        reporter.on_hit_selected(&hit(1), 2.5);
        reporter.on_hit_accepted(&hit(1), 2.5);
        reporter.on_hit_rejected(&hit(2), &FitError::failed("singular"));
        reporter.on_track_discarded(
            1,
            &TrackDiscard::TooFewHits {
                hits_in_fit: 2,
                required: 3,
            },
        );

        assert_eq!(reporter.events(), &[4]);
        assert_eq!(reporter.selected_hits(), &[HitId(1)]);
        assert_eq!(reporter.accepted_hits(), &[(HitId(1), 2.5)]);
        assert_eq!(reporter.rejected_hits(), &[HitId(2)]);
        assert_eq!(reporter.discarded().len(), 1);

        reporter.clear();
        assert!(reporter.events().is_empty());
        assert!(reporter.accepted_hits().is_empty());
    }

    #[test]
    fn test_composite_forwards_to_both() {
        let mut composite = CompositeReporter::new(DebugReporter::new(), DebugReporter::new());
        composite.on_hit_accepted(&hit(7), 1.0);
        composite.on_hit_rejected(&hit(8), &FitError::NotInitialised);

        let (first, second) = composite.into_parts();
        assert_eq!(first.accepted_hits(), second.accepted_hits());
        assert_eq!(first.rejected_hits(), &[HitId(8)]);
    }
}
