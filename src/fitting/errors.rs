//! Errors reported by a fit engine

use std::fmt;

/// Errors that can occur inside a fit session
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// The session was used before `initialise`
    NotInitialised,

    /// The track does not intersect the requested surface
    NoIntersection {
        /// Raw identifier of the requested layer
        layer: u32,
    },

    /// The hit was tested but exceeded the chi-square cut
    Rejected {
        /// Chi-square increment the hit would have added
        chi2_increment: f64,
        /// Cut that was applied
        max_chi2_increment: f64,
    },

    /// Any other engine failure
    Failed {
        /// Description of the failure
        description: String,
    },
}

impl FitError {
    /// Convenience constructor for [`FitError::Failed`]
    pub fn failed(description: impl Into<String>) -> Self {
        FitError::Failed {
            description: description.into(),
        }
    }
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::NotInitialised => write!(f, "Fit session used before initialisation"),
            FitError::NoIntersection { layer } => {
                write!(f, "No intersection with layer {}", layer)
            }
            FitError::Rejected {
                chi2_increment,
                max_chi2_increment,
            } => write!(
                f,
                "Hit rejected: chi2 increment {} exceeds {}",
                chi2_increment, max_chi2_increment
            ),
            FitError::Failed { description } => write!(f, "Fit failed: {}", description),
        }
    }
}

impl std::error::Error for FitError {}
