//! Interface of the Kalman fit engine
//!
//! Track propagation, covariance updates and chi-square evaluation are provided
//! by an external engine. The extrapolation code drives it through these two
//! traits: a [`FitSystem`] configured once per run, which hands out one
//! [`FitSession`] per track.

use crate::common::DetectorElementId;
use crate::extrapolation::config::FitOptions;
use crate::extrapolation::types::{TrackState, TrackerHit};

use super::errors::FitError;

/// Order in which a session visits its hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitDirection {
    /// From the innermost hit outwards
    Forward,
    /// From the outermost hit inwards
    Backward,
}

/// How a propagation target surface is chosen among several candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationMode {
    /// Nearest crossing along the helix
    Closest,
    /// Next crossing moving forward along the helix
    Forward,
    /// Next crossing moving backward along the helix
    Backward,
}

/// Result of propagating a session to a layer
#[derive(Debug, Clone, PartialEq)]
pub struct Propagation {
    /// Predicted state at the layer surface
    pub state: TrackState,
    /// Chi-square of the fit so far
    pub chi2: f64,
    /// Degrees of freedom of the fit so far
    pub ndf: i32,
    /// Element struck at the crossing point ([`DetectorElementId::NONE`] if none)
    pub element_id: DetectorElementId,
}

/// Current fitted state of a session
#[derive(Debug, Clone, PartialEq)]
pub struct FittedState {
    /// Track state
    pub state: TrackState,
    /// Total chi-square
    pub chi2: f64,
    /// Degrees of freedom
    pub ndf: i32,
}

/// A hit together with the chi-square it contributed (or would have)
pub type WeightedHit = (TrackerHit, f64);

/// Fit engine configured once per run
pub trait FitSystem {
    /// Per-track session type
    type Session: FitSession;

    /// Apply material-effect options and prepare the engine.
    ///
    /// A failure here is fatal for the whole run.
    fn init(&mut self, options: &FitOptions) -> Result<(), FitError>;

    /// Create an empty session for one track
    fn create_session(&self) -> Self::Session;

    /// Engine name for logging
    fn name(&self) -> &str {
        "fit-system"
    }
}

/// Kalman fit state of a single track
pub trait FitSession {
    /// Queue a hit for the next [`fit`](FitSession::fit)
    fn add_hit(&mut self, hit: &TrackerHit) -> Result<(), FitError>;

    /// Seed the session with a state and field, choosing the fit direction
    fn initialise(
        &mut self,
        state: &TrackState,
        b_field: f64,
        direction: FitDirection,
    ) -> Result<(), FitError>;

    /// Fit all queued hits; hits exceeding `max_chi2_per_hit` become outliers
    fn fit(&mut self, max_chi2_per_hit: f64) -> Result<(), FitError>;

    /// Propagate the current state to the surface of a layer
    fn propagate_to_layer(
        &mut self,
        layer: DetectorElementId,
        mode: PropagationMode,
    ) -> Result<Propagation, FitError>;

    /// Chi-square increment of adding `hit`, without committing it
    fn test_chi2_increment(&mut self, hit: &TrackerHit) -> Result<f64, FitError>;

    /// Add `hit` to the fit if its increment does not exceed
    /// `max_chi2_increment`; returns the increment on success.
    fn add_and_fit(&mut self, hit: &TrackerHit, max_chi2_increment: f64) -> Result<f64, FitError>;

    /// Current fitted state
    fn track_state(&self) -> Result<FittedState, FitError>;

    /// Hits contributing to the fit, in fit order
    fn hits_in_fit(&self) -> Vec<WeightedHit>;

    /// Hits tested during the fit but excluded from it
    fn outliers(&self) -> Vec<WeightedHit>;
}
