//! Fit engine interface consumed by the extrapolation
//!
//! - [`traits`] - [`FitSystem`] and [`FitSession`]
//! - [`errors`] - [`FitError`]

pub mod errors;
pub mod traits;

pub use errors::FitError;
pub use traits::{
    FitDirection, FitSession, FitSystem, FittedState, Propagation, PropagationMode, WeightedHit,
};
