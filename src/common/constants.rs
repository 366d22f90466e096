//! Constants shared by the extrapolation components
//!
//! These are fixed by the detector description conventions rather than being
//! user-configurable. Tunable parameters live in
//! [`ExtrapolationConfig`](crate::extrapolation::ExtrapolationConfig).

/// Cell identifier layout used to label tracker hits.
///
/// Five fields packed into the low 32 bits: subdetector (5 bits), side
/// (2 bits, signed), layer (9 bits), module (8 bits) and sensor (8 bits).
/// Hit association compares identifiers by their raw integer value, so any
/// other layout silently breaks element lookups.
pub const ILD_CELL_ID_ENCODING: &str = "subdet:5,side:-2,layer:9,module:8,sensor:8";

/// Field name of the subdetector index
pub const FIELD_SUBDET: &str = "subdet";

/// Field name of the detector side (barrel = 0, endcaps = ±1)
pub const FIELD_SIDE: &str = "side";

/// Field name of the layer index
pub const FIELD_LAYER: &str = "layer";

/// Field name of the module (stave, ladder or petal) index
pub const FIELD_MODULE: &str = "module";

/// Field name of the sensor index within a module
pub const FIELD_SENSOR: &str = "sensor";

/// Minimum number of hits that must remain in a fit for a track to be kept.
pub const MIN_HITS_IN_FIT: usize = 3;

/// Default maximum chi-square increment accepted when adding a hit.
pub const DEFAULT_MAX_CHI2_INCREMENT: f64 = 1000.0;

/// Default multiplier of the extrapolated d0/z0 uncertainty used for the
/// diagnostic search window.
pub const DEFAULT_SEARCH_SIGMA: f64 = 3.0;
