//! Scripted fit engine
//!
//! Propagation targets and chi-square values are looked up in a [`Script`]
//! instead of being computed, so tests control every decision the
//! extrapolation makes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracker_extrapolation::extrapolation::types::{HitId, TrackState, TrackerHit};
use tracker_extrapolation::fitting::{
    FitDirection, FitError, FitSession, FitSystem, FittedState, Propagation, PropagationMode,
    WeightedHit,
};
use tracker_extrapolation::{DetectorElementId, FitOptions};

/// Chi-square contributed by a seed hit without a scripted value
pub const DEFAULT_FIT_CHI2: f64 = 0.5;

/// Decisions of the scripted engine
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Layer key → element struck on that layer; missing layers do not intersect
    pub propagations: HashMap<DetectorElementId, DetectorElementId>,
    /// Chi-square increment per hit; unscripted hits fail the chi-square test
    pub chi2: HashMap<HitId, f64>,
    /// Hits a full fit excludes as outliers
    pub fit_outliers: HashSet<HitId>,
    /// `FitSystem::init` fails
    pub fail_system_init: bool,
    /// `initialise` fails
    pub fail_initialise: bool,
    /// Forward fits fail
    pub fail_fit: bool,
    /// Backward fits fail
    pub fail_refit: bool,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn propagate(mut self, layer: DetectorElementId, element: DetectorElementId) -> Self {
        self.propagations.insert(layer, element);
        self
    }

    pub fn chi2(mut self, hit: HitId, chi2: f64) -> Self {
        self.chi2.insert(hit, chi2);
        self
    }

    pub fn fit_outlier(mut self, hit: HitId) -> Self {
        self.fit_outliers.insert(hit);
        self
    }
}

/// Fit system handing out [`ScriptedSession`]s
#[derive(Debug, Clone, Default)]
pub struct ScriptedFitSystem {
    script: Arc<Script>,
    /// Options passed to `init`
    pub options: Option<FitOptions>,
}

impl ScriptedFitSystem {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            options: None,
        }
    }
}

impl FitSystem for ScriptedFitSystem {
    type Session = ScriptedSession;

    fn init(&mut self, options: &FitOptions) -> Result<(), FitError> {
        if self.script.fail_system_init {
            return Err(FitError::failed("scripted init failure"));
        }
        self.options = Some(*options);
        Ok(())
    }

    fn create_session(&self) -> ScriptedSession {
        ScriptedSession {
            script: Arc::clone(&self.script),
            queued: Vec::new(),
            state: None,
            direction: FitDirection::Forward,
            hits_in_fit: Vec::new(),
            outliers: Vec::new(),
            chi2: 0.0,
            ndf: 0,
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// One track's scripted fit
#[derive(Debug, Clone)]
pub struct ScriptedSession {
    script: Arc<Script>,
    queued: Vec<TrackerHit>,
    state: Option<TrackState>,
    direction: FitDirection,
    hits_in_fit: Vec<WeightedHit>,
    outliers: Vec<WeightedHit>,
    chi2: f64,
    ndf: i32,
}

impl ScriptedSession {
    fn current_state(&self) -> Result<&TrackState, FitError> {
        self.state.as_ref().ok_or(FitError::NotInitialised)
    }

    fn include(&mut self, hit: TrackerHit, chi2: f64) {
        self.hits_in_fit.push((hit, chi2));
        self.chi2 += chi2;
        self.ndf += 2;
    }
}

impl FitSession for ScriptedSession {
    fn add_hit(&mut self, hit: &TrackerHit) -> Result<(), FitError> {
        self.queued.push(*hit);
        Ok(())
    }

    fn initialise(
        &mut self,
        state: &TrackState,
        _b_field: f64,
        direction: FitDirection,
    ) -> Result<(), FitError> {
        if self.script.fail_initialise {
            return Err(FitError::failed("scripted initialise failure"));
        }
        self.state = Some(state.clone());
        self.direction = direction;
        Ok(())
    }

    fn fit(&mut self, max_chi2_per_hit: f64) -> Result<(), FitError> {
        self.current_state()?;
        let fails = match self.direction {
            FitDirection::Forward => self.script.fail_fit,
            FitDirection::Backward => self.script.fail_refit,
        };
        if fails {
            return Err(FitError::failed("scripted fit failure"));
        }

        let queued = std::mem::take(&mut self.queued);
        let ordered: Vec<TrackerHit> = match self.direction {
            FitDirection::Forward => queued,
            FitDirection::Backward => queued.into_iter().rev().collect(),
        };
        for hit in ordered {
            let chi2 = self
                .script
                .chi2
                .get(&hit.id)
                .copied()
                .unwrap_or(DEFAULT_FIT_CHI2);
            if self.script.fit_outliers.contains(&hit.id) || chi2 > max_chi2_per_hit {
                self.outliers.push((hit, chi2));
            } else {
                self.include(hit, chi2);
            }
        }
        Ok(())
    }

    fn propagate_to_layer(
        &mut self,
        layer: DetectorElementId,
        _mode: PropagationMode,
    ) -> Result<Propagation, FitError> {
        let state = self.current_state()?.clone();
        let element_id = self
            .script
            .propagations
            .get(&layer)
            .copied()
            .ok_or(FitError::NoIntersection { layer: layer.raw() })?;
        Ok(Propagation {
            state,
            chi2: self.chi2,
            ndf: self.ndf,
            element_id,
        })
    }

    fn test_chi2_increment(&mut self, hit: &TrackerHit) -> Result<f64, FitError> {
        self.current_state()?;
        self.script
            .chi2
            .get(&hit.id)
            .copied()
            .ok_or_else(|| FitError::failed(format!("no chi2 scripted for {:?}", hit.id)))
    }

    fn add_and_fit(&mut self, hit: &TrackerHit, max_chi2_increment: f64) -> Result<f64, FitError> {
        let chi2 = self.test_chi2_increment(hit)?;
        if chi2 > max_chi2_increment {
            self.outliers.push((*hit, chi2));
            return Err(FitError::Rejected {
                chi2_increment: chi2,
                max_chi2_increment,
            });
        }
        self.include(*hit, chi2);
        Ok(chi2)
    }

    fn track_state(&self) -> Result<FittedState, FitError> {
        Ok(FittedState {
            state: self.current_state()?.clone(),
            chi2: self.chi2,
            ndf: self.ndf,
        })
    }

    fn hits_in_fit(&self) -> Vec<WeightedHit> {
        self.hits_in_fit.clone()
    }

    fn outliers(&self) -> Vec<WeightedHit> {
        self.outliers.clone()
    }
}
