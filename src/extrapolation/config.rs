//! Configuration of the extrapolation
//!
//! Collection names, the subdetectors to extrapolate through, fit engine options
//! and hit acceptance cuts. Configurations can be loaded from JSON; missing keys
//! take the defaults below.
//!
//! ```json
//! {
//!   "inputTrackCollection": "VXDTracks",
//!   "hitCollections": ["ITrackerHits", "OTrackerHits"],
//!   "subdetectorNames": ["InnerTrackerBarrel", "OuterTrackerBarrel"],
//!   "maxChi2Increment": 500.0,
//!   "fit": { "multipleScattering": true, "energyLoss": false }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::common::constants::{DEFAULT_MAX_CHI2_INCREMENT, DEFAULT_SEARCH_SIGMA};

use super::errors::ExtrapolationError;

/// Material-effect and smoothing switches passed to the fit engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FitOptions {
    /// Include multiple scattering in the fit
    pub multiple_scattering: bool,
    /// Include energy loss in material
    pub energy_loss: bool,
    /// Smooth all measurement sites
    pub smoothing: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            multiple_scattering: true,
            energy_loss: true,
            smoothing: false,
        }
    }
}

/// Extrapolation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtrapolationConfig {
    /// Collection holding the seed tracks
    pub input_track_collection: String,
    /// Raw hit collection per subdetector, paired by position with
    /// `subdetector_names`. An empty name means no hits for that subdetector.
    pub hit_collections: Vec<String>,
    /// Subdetectors to extrapolate through, in traversal order
    pub subdetector_names: Vec<String>,
    /// Collection receiving the extended tracks
    pub output_track_collection: String,
    /// Collection receiving the hits not attached to any track
    pub output_unused_hit_collection: String,
    /// Fit engine switches
    pub fit: FitOptions,
    /// Maximum chi-square increment for a hit to be added
    pub max_chi2_increment: f64,
    /// Multiplier of the extrapolated d0/z0 uncertainty for the logged search window
    pub search_sigma: f64,
    /// Refit the extended track backwards before writing it out
    pub perform_final_refit: bool,
}

impl Default for ExtrapolationConfig {
    fn default() -> Self {
        Self {
            input_track_collection: "TruthTracks".to_string(),
            hit_collections: vec![
                "ITrackerHits".to_string(),
                "OTrackerHits".to_string(),
                "ITrackerEndcapHits".to_string(),
                "OTrackerEndcapHits".to_string(),
            ],
            subdetector_names: vec![
                "InnerTrackerBarrel".to_string(),
                "OuterTrackerBarrel".to_string(),
                "InnerTrackerEndcap".to_string(),
                "OuterTrackerEndcap".to_string(),
            ],
            output_track_collection: "ExtrTracks".to_string(),
            output_unused_hit_collection: "NotUsedHits".to_string(),
            fit: FitOptions::default(),
            max_chi2_increment: DEFAULT_MAX_CHI2_INCREMENT,
            search_sigma: DEFAULT_SEARCH_SIGMA,
            perform_final_refit: false,
        }
    }
}

impl ExtrapolationConfig {
    /// Parse a JSON configuration and validate it
    pub fn from_json_str(json: &str) -> Result<Self, ExtrapolationError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ExtrapolationError::Configuration {
                description: format!("invalid JSON configuration: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> String {
        // Plain strings, numbers and bools only: serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<(), ExtrapolationError> {
        let fail = |description: String| Err(ExtrapolationError::Configuration { description });

        if self.hit_collections.len() != self.subdetector_names.len() {
            return fail(format!(
                "{} hit collections configured for {} subdetectors; the lists are paired by position",
                self.hit_collections.len(),
                self.subdetector_names.len()
            ));
        }
        if self.input_track_collection.is_empty() {
            return fail("input track collection name is empty".to_string());
        }
        if self.output_track_collection.is_empty() || self.output_unused_hit_collection.is_empty()
        {
            return fail("output collection names must not be empty".to_string());
        }
        if self.output_track_collection == self.output_unused_hit_collection {
            return fail(format!(
                "output collections share the name '{}'",
                self.output_track_collection
            ));
        }
        if !(self.max_chi2_increment > 0.0) {
            return fail(format!(
                "max chi2 increment must be positive, got {}",
                self.max_chi2_increment
            ));
        }
        if !(self.search_sigma >= 0.0) || !self.search_sigma.is_finite() {
            return fail(format!(
                "search sigma must be finite and non-negative, got {}",
                self.search_sigma
            ));
        }
        Ok(())
    }

    /// Number of configured subdetectors
    #[inline]
    pub fn num_subdetectors(&self) -> usize {
        self.subdetector_names.len()
    }

    /// Set the seed track collection
    pub fn with_input_track_collection(mut self, name: impl Into<String>) -> Self {
        self.input_track_collection = name.into();
        self
    }

    /// Replace the subdetector list with `(hit collection, subdetector)` pairs
    pub fn with_subdetectors<H, S>(mut self, pairs: impl IntoIterator<Item = (H, S)>) -> Self
    where
        H: Into<String>,
        S: Into<String>,
    {
        let (hits, names): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(h, s)| (h.into(), s.into()))
            .unzip();
        self.hit_collections = hits;
        self.subdetector_names = names;
        self
    }

    /// Set the output collection names
    pub fn with_outputs(mut self, tracks: impl Into<String>, unused_hits: impl Into<String>) -> Self {
        self.output_track_collection = tracks.into();
        self.output_unused_hit_collection = unused_hits.into();
        self
    }

    /// Set the fit engine switches
    pub fn with_fit_options(mut self, fit: FitOptions) -> Self {
        self.fit = fit;
        self
    }

    /// Set the hit acceptance cut
    pub fn with_max_chi2_increment(mut self, max_chi2_increment: f64) -> Self {
        self.max_chi2_increment = max_chi2_increment;
        self
    }

    /// Set the diagnostic search window multiplier
    pub fn with_search_sigma(mut self, search_sigma: f64) -> Self {
        self.search_sigma = search_sigma;
        self
    }

    /// Enable or disable the final backward refit
    pub fn with_final_refit(mut self, enabled: bool) -> Self {
        self.perform_final_refit = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExtrapolationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_subdetectors(), 4);
        assert_eq!(config.max_chi2_increment, 1000.0);
        assert_eq!(config.search_sigma, 3.0);
        assert!(config.fit.multiple_scattering);
        assert!(config.fit.energy_loss);
        assert!(!config.fit.smoothing);
        assert!(!config.perform_final_refit);
    }

    #[test]
    fn test_json_partial_overrides() {
        let config = ExtrapolationConfig::from_json_str(
            r#"{
                "inputTrackCollection": "VXDTracks",
                "hitCollections": ["ITrackerHits"],
                "subdetectorNames": ["InnerTrackerBarrel"],
                "maxChi2Increment": 50.0,
                "fit": { "energyLoss": false }
            }"#,
        )
        .unwrap();

        assert_eq!(config.input_track_collection, "VXDTracks");
        assert_eq!(config.num_subdetectors(), 1);
        assert_eq!(config.max_chi2_increment, 50.0);
        assert_eq!(config.output_track_collection, "ExtrTracks");
        assert!(config.fit.multiple_scattering);
        assert!(!config.fit.energy_loss);
    }

    #[test]
    fn test_json_round_trip() {
        let config = ExtrapolationConfig::default()
            .with_final_refit(true)
            .with_search_sigma(5.0);
        let parsed = ExtrapolationConfig::from_json_str(&config.to_json_string()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_mismatched_pairing_rejected() {
        let mut config = ExtrapolationConfig::default();
        config.hit_collections.pop();
        assert!(matches!(
            config.validate(),
            Err(ExtrapolationError::Configuration { .. })
        ));
    }

    #[test]
    fn test_invalid_cuts_rejected() {
        let config = ExtrapolationConfig::default().with_max_chi2_increment(0.0);
        assert!(config.validate().is_err());

        let config = ExtrapolationConfig::default().with_max_chi2_increment(f64::NAN);
        assert!(config.validate().is_err());

        let config = ExtrapolationConfig::default().with_search_sigma(-1.0);
        assert!(config.validate().is_err());

        let config = ExtrapolationConfig::default().with_outputs("Same", "Same");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(ExtrapolationConfig::from_json_str("{ not json").is_err());
        assert!(ExtrapolationConfig::from_json_str(r#"{"maxChi2Increment": "big"}"#).is_err());
    }

    #[test]
    fn test_with_subdetectors_pairs_names() {
        let config = ExtrapolationConfig::default()
            .with_subdetectors([("ITrackerHits", "InnerTrackerBarrel"), ("", "OuterTrackerBarrel")]);
        assert_eq!(config.hit_collections, vec!["ITrackerHits", ""]);
        assert_eq!(
            config.subdetector_names,
            vec!["InnerTrackerBarrel", "OuterTrackerBarrel"]
        );
        assert!(config.validate().is_ok());
    }
}
