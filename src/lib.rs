/*!
# Tracker extrapolation

Extends seed tracks from an inner detector outward through the layers of a
silicon outer tracker, attaching at most one hit per layer with an incremental
Kalman fit, and reports the hits no track used.

## Features

- Largest-pt-first processing, so straighter tracks pick shared hits first
- 3×3 neighbour search around the struck module/sensor with azimuthal wrap
- Best hit by incremental chi-square, removed from the event index on selection
- Optional backward refit of the extended track

## Modules

- [`extrapolation`] - the propagate/search/fit loop and the event driver
- [`fitting`] - interface of the external Kalman fit engine
- [`geometry`] - detector description queries and the per-run catalog
- [`event`] - typed event store
- [`reporter`] - observability hooks
- [`common`] - cell identifier codec and constants

## Example

```rust,no_run
use tracker_extrapolation::{
    Event, EventDriver, ExtrapolationConfig, ExtrapolationError, FitSystem, StaticGeometry,
};

fn run<F: FitSystem>(fit_system: F, events: &mut [Event]) -> Result<(), ExtrapolationError> {
    let geometry = StaticGeometry::new(3.5)
        .with_barrel("InnerTrackerBarrel", 3, &[32, 32, 48])
        .with_barrel("OuterTrackerBarrel", 5, &[64, 80, 96]);

    let config = ExtrapolationConfig::default()
        .with_input_track_collection("VXDTracks")
        .with_subdetectors([
            ("ITrackerHits", "InnerTrackerBarrel"),
            ("OTrackerHits", "OuterTrackerBarrel"),
        ]);

    let mut driver = EventDriver::new(config, &geometry, fit_system)?;
    driver.process_run_header(0);
    for event in events.iter_mut() {
        driver.process_event(event)?;
    }
    driver.end();
    Ok(())
}
```
*/

// ============================================================================
// Core modules
// ============================================================================

/// Extrapolation of seed tracks through the outer tracker
///
/// - Per track: [`TrackExtrapolator`]
/// - Per event and run: [`EventDriver`]
pub mod extrapolation;

/// Fit engine interface
pub mod fitting;

/// Detector geometry queries and catalog
pub mod geometry;

/// Event store and collections
pub mod event;

/// Cell identifier codec and constants
pub mod common;

/// Observability hooks
pub mod reporter;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// Core types
pub use extrapolation::{
    ExtendedTrack, ExtrapolationConfig, FitOptions, HitCount, HitId, Track, TrackState, TrackerHit,
};

// Errors
pub use common::CellIdError;
pub use extrapolation::{ExtrapolationError, TrackDiscard};
pub use fitting::FitError;
pub use geometry::GeometryError;

// Traits
pub use event::EventStore;
pub use fitting::{FitSession, FitSystem};
pub use geometry::GeometryProvider;
pub use reporter::ExtrapolationReporter;

// Algorithms
pub use extrapolation::{
    neighbours, select_best, EventDriver, EventOutput, HitIndex, RunStatistics, TrackExtrapolator,
};

// Implementations
pub use common::{CellIdCodec, DetectorElementId};
pub use event::{Collection, Event, HitCollection};
pub use geometry::{GeometryCatalog, StaticGeometry};
pub use reporter::{CompositeReporter, DebugReporter, LoggingReporter, NoOpReporter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
