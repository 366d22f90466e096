//! Event driver
//!
//! [`EventDriver`] owns everything that lives for a run: the configuration,
//! the geometry catalog, the fit system, the reporter and the run statistics.
//! Per event it orders the seeds by decreasing transverse momentum, rebuilds
//! the hit index, extrapolates each seed and collects the leftover hits.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::event::{Collection, EventStore, HitCollection};
use crate::fitting::FitSystem;
use crate::geometry::{GeometryCatalog, GeometryProvider};
use crate::reporter::{ExtrapolationReporter, LoggingReporter};

use super::config::ExtrapolationConfig;
use super::errors::ExtrapolationError;
use super::extrapolator::{TrackExtrapolator, TrackTally};
use super::hit_index::HitIndex;
use super::output::ExtendedTrack;
use super::types::{HitId, Track, TrackerHit};

/// Counters accumulated over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    /// Run headers seen
    pub runs: usize,
    /// Events processed
    pub events: usize,
    /// Hits picked by the selector
    pub hits_considered: usize,
    /// Picked hits added to a fit
    pub hits_fitted: usize,
    /// Picked hits refused by the fit
    pub hits_rejected: usize,
    /// Extended tracks written
    pub tracks_produced: usize,
    /// Seeds dropped
    pub tracks_discarded: usize,
}

impl RunStatistics {
    fn record(&mut self, tally: &TrackTally) {
        self.hits_considered += tally.considered;
        self.hits_fitted += tally.fitted;
        self.hits_rejected += tally.rejected;
    }
}

/// Run-scoped state shared by all events
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    /// Subdetector layouts and field value
    pub catalog: GeometryCatalog,
    /// Counters
    pub statistics: RunStatistics,
}

/// Result of processing one event
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventOutput {
    /// Extended tracks, in processing order
    pub tracks: Vec<ExtendedTrack>,
    /// Hits never selected for any track
    pub leftover_hits: Vec<TrackerHit>,
    /// Hits selected for a track but not in the fit of any output track
    /// (refused by the fit, or taken by a discarded track)
    pub consumed_hits: Vec<TrackerHit>,
}

/// Runs the extrapolation over the events of a run.
pub struct EventDriver<F: FitSystem, R: ExtrapolationReporter = LoggingReporter> {
    config: ExtrapolationConfig,
    fit_system: F,
    context: RunContext,
    reporter: R,
}

impl<F: FitSystem> EventDriver<F> {
    /// Validate the configuration, load the geometry and initialise the fit
    /// system. Any failure here aborts the run.
    pub fn new<G: GeometryProvider + ?Sized>(
        config: ExtrapolationConfig,
        geometry: &G,
        mut fit_system: F,
    ) -> Result<Self, ExtrapolationError> {
        config.validate()?;

        let catalog = GeometryCatalog::load(geometry, &config.subdetector_names);
        fit_system.init(&config.fit)?;
        log::info!(
            "Extrapolation through {} subdetectors with {} (B = {} T, max chi2 increment {}, final refit {})",
            catalog.len(),
            fit_system.name(),
            catalog.b_field(),
            config.max_chi2_increment,
            config.perform_final_refit
        );

        Ok(Self {
            config,
            fit_system,
            context: RunContext {
                catalog,
                statistics: RunStatistics::default(),
            },
            reporter: LoggingReporter::new(),
        })
    }
}

impl<F: FitSystem, R: ExtrapolationReporter> EventDriver<F, R> {
    /// Replace the reporter
    pub fn with_reporter<R2: ExtrapolationReporter>(self, reporter: R2) -> EventDriver<F, R2> {
        EventDriver {
            config: self.config,
            fit_system: self.fit_system,
            context: self.context,
            reporter,
        }
    }

    /// Configuration of the run
    pub fn config(&self) -> &ExtrapolationConfig {
        &self.config
    }

    /// Geometry catalog of the run
    pub fn catalog(&self) -> &GeometryCatalog {
        &self.context.catalog
    }

    /// Counters so far
    pub fn statistics(&self) -> &RunStatistics {
        &self.context.statistics
    }

    /// The reporter
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Mutable access to the reporter
    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    /// Consume the driver, returning its reporter
    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Start of a new run
    pub fn process_run_header(&mut self, run_number: u32) {
        self.context.statistics.runs += 1;
        log::info!("Run {} started", run_number);
    }

    /// Extrapolate `tracks` through the hits in `collections`.
    ///
    /// `collections` is paired by position with the configured subdetectors;
    /// `None` marks a collection missing from the event.
    pub fn process(&mut self, tracks: &[Track], collections: &[Option<&HitCollection>]) -> EventOutput {
        let event_number = self.context.statistics.events as u64;
        self.run_event(event_number, tracks, collections)
    }

    /// Read the seeds and hits from `store`, extrapolate, and add the output
    /// track and leftover hit collections.
    ///
    /// An event without the input track collection is left untouched, and so
    /// is an event that already holds a collection named like an output.
    pub fn process_event<E: EventStore + ?Sized>(&mut self, store: &mut E) -> Result<(), ExtrapolationError> {
        let output = {
            let Some(tracks) = store.tracks(&self.config.input_track_collection) else {
                log::debug!(
                    "Event {}: no collection {}, skipping",
                    store.event_number(),
                    self.config.input_track_collection
                );
                return Ok(());
            };

            for name in [
                &self.config.output_track_collection,
                &self.config.output_unused_hit_collection,
            ] {
                if store.collection(name).is_some() {
                    return Err(ExtrapolationError::DuplicateCollection { name: name.clone() });
                }
            }

            let collections: Vec<Option<&HitCollection>> = self
                .config
                .hit_collections
                .iter()
                .map(|name| {
                    if name.is_empty() {
                        None
                    } else {
                        store.hits(name)
                    }
                })
                .collect();

            self.run_event(store.event_number(), tracks, &collections)
        };

        store.add_collection(
            &self.config.output_track_collection,
            Collection::ExtendedTracks(output.tracks),
        )?;
        let leftovers = HitCollection::new(output.leftover_hits).as_subset();
        store.add_collection(
            &self.config.output_unused_hit_collection,
            Collection::Hits(leftovers),
        )?;
        Ok(())
    }

    /// End of the run; logs and returns the counters
    pub fn end(&self) -> &RunStatistics {
        let stats = &self.context.statistics;
        log::info!(
            "Extrapolation finished: {} events, {} tracks written, {} dropped",
            stats.events,
            stats.tracks_produced,
            stats.tracks_discarded
        );
        log::info!(
            "Hits considered {}, fitted {}, not fitted {}",
            stats.hits_considered,
            stats.hits_fitted,
            stats.hits_rejected
        );
        log::debug!("{}", serde_json::to_string(stats).unwrap_or_default());
        stats
    }

    fn run_event(
        &mut self,
        event_number: u64,
        tracks: &[Track],
        collections: &[Option<&HitCollection>],
    ) -> EventOutput {
        if collections.len() != self.context.catalog.len() {
            log::warn!(
                "Event {}: {} hit collections for {} subdetectors",
                event_number,
                collections.len(),
                self.context.catalog.len()
            );
        }
        self.reporter.on_event_start(event_number, tracks.len());

        let mut order: Vec<usize> = (0..tracks.len()).collect();
        order.sort_by(|&a, &b| tracks[a].abs_omega().total_cmp(&tracks[b].abs_omega()));

        let mut index = HitIndex::build(collections);
        let extrapolator = TrackExtrapolator::new(&self.fit_system, &self.context.catalog, &self.config);
        let mut output = EventOutput::default();

        for seed_index in order {
            let mut tally = TrackTally::default();
            let result = extrapolator.extrapolate(
                seed_index,
                &tracks[seed_index],
                &mut index,
                &mut tally,
                &mut self.reporter,
            );
            self.context.statistics.record(&tally);

            match result {
                Ok(track) => {
                    let in_fit: BTreeSet<HitId> = track.hits().map(|h| h.id).collect();
                    output
                        .consumed_hits
                        .extend(tally.taken.into_iter().filter(|h| !in_fit.contains(&h.id)));
                    self.context.statistics.tracks_produced += 1;
                    self.reporter.on_track_finalized(&track);
                    output.tracks.push(track);
                }
                Err(reason) => {
                    output.consumed_hits.extend(tally.taken);
                    self.context.statistics.tracks_discarded += 1;
                    self.reporter.on_track_discarded(seed_index, &reason);
                }
            }
        }

        output.leftover_hits = index.leftovers();
        self.context.statistics.events += 1;
        self.reporter
            .on_event_complete(&output.tracks, output.leftover_hits.len());
        output
    }
}
