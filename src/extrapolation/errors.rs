//! Error types for the extrapolation
//!
//! Run-level failures are reported as [`ExtrapolationError`]. Per-track failures
//! never abort an event: they are reported as a [`TrackDiscard`] and the track
//! simply contributes nothing to the output.

use std::fmt;

use crate::fitting::FitError;
use crate::geometry::GeometryError;

/// Errors that stop a run (or reject an event store operation)
#[derive(Debug, Clone)]
pub enum ExtrapolationError {
    /// Invalid configuration
    Configuration {
        /// Description of the configuration issue
        description: String,
    },

    /// The detector description could not be read
    Geometry(GeometryError),

    /// The fit engine could not be initialised
    FitSystem(FitError),

    /// An output collection name is already used in the event
    DuplicateCollection {
        /// Collection name
        name: String,
    },
}

impl fmt::Display for ExtrapolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtrapolationError::Configuration { description } => {
                write!(f, "Configuration error: {}", description)
            }
            ExtrapolationError::Geometry(e) => write!(f, "Geometry error: {}", e),
            ExtrapolationError::FitSystem(e) => {
                write!(f, "Cannot initialise fit system: {}", e)
            }
            ExtrapolationError::DuplicateCollection { name } => {
                write!(f, "Collection '{}' already exists in the event", name)
            }
        }
    }
}

impl std::error::Error for ExtrapolationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtrapolationError::Geometry(e) => Some(e),
            ExtrapolationError::FitSystem(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FitError> for ExtrapolationError {
    fn from(e: FitError) -> Self {
        ExtrapolationError::FitSystem(e)
    }
}

impl From<GeometryError> for ExtrapolationError {
    fn from(e: GeometryError) -> Self {
        ExtrapolationError::Geometry(e)
    }
}

/// Why a track was dropped from the output
#[derive(Debug, Clone, PartialEq)]
pub enum TrackDiscard {
    /// The session could not be seeded from the track
    Initialisation(FitError),

    /// Fitting the seed hits failed
    InitialFit(FitError),

    /// Fewer hits than required remained in the fit
    TooFewHits {
        /// Hits in the final fit
        hits_in_fit: usize,
        /// Required minimum
        required: usize,
    },

    /// The final backward refit failed
    Refit(FitError),

    /// The final state could not be read from the session
    Finalisation(FitError),
}

impl fmt::Display for TrackDiscard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackDiscard::Initialisation(e) => write!(f, "initialisation failed: {}", e),
            TrackDiscard::InitialFit(e) => write!(f, "seed fit failed: {}", e),
            TrackDiscard::TooFewHits {
                hits_in_fit,
                required,
            } => write!(
                f,
                "only {} hits in fit, at least {} required",
                hits_in_fit, required
            ),
            TrackDiscard::Refit(e) => write!(f, "final refit failed: {}", e),
            TrackDiscard::Finalisation(e) => write!(f, "finalisation failed: {}", e),
        }
    }
}

impl std::error::Error for TrackDiscard {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackDiscard::Initialisation(e)
            | TrackDiscard::InitialFit(e)
            | TrackDiscard::Refit(e)
            | TrackDiscard::Finalisation(e) => Some(e),
            TrackDiscard::TooFewHits { .. } => None,
        }
    }
}
