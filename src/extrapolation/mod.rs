//! Track extrapolation through the outer tracker
//!
//! Leaves first:
//! - [`types`] - track, state and hit types
//! - [`config`] - [`ExtrapolationConfig`] and [`FitOptions`]
//! - [`hit_index`] - per-event index of unused hits by element
//! - [`neighbors`] - struck element and its neighbours
//! - [`selector`] - best hit by incremental chi-square
//! - [`extrapolator`] - the per-track propagate/search/fit loop
//! - [`driver`] - per-event ordering, aggregation and run bookkeeping
//! - [`output`] - [`ExtendedTrack`]
//! - [`errors`] - [`ExtrapolationError`] and [`TrackDiscard`]

pub mod config;
pub mod driver;
pub mod errors;
pub mod extrapolator;
pub mod hit_index;
pub mod neighbors;
pub mod output;
pub mod selector;
pub mod types;

pub use config::{ExtrapolationConfig, FitOptions};
pub use driver::{EventDriver, EventOutput, RunContext, RunStatistics};
pub use errors::{ExtrapolationError, TrackDiscard};
pub use extrapolator::{SearchWindow, TrackExtrapolator, TrackTally};
pub use hit_index::{HitIndex, SubdetectorHits};
pub use neighbors::{neighbours, Neighbourhood};
pub use output::{subdetector_hit_numbers, ExtendedTrack, HitCount};
pub use selector::select_best;
pub use types::{sort_by_radius, HitId, Track, TrackState, TrackerHit};
