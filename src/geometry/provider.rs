//! Detector geometry queries
//!
//! [`GeometryProvider`] is the interface to the detector description: name to
//! id resolution, per-layer module counts of barrel (z-planar) and endcap
//! (z-disk petal) trackers, and the magnetic field. [`StaticGeometry`] is an
//! in-memory implementation that can be loaded from JSON.

use std::fmt;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Errors from geometry queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// No detector with this name
    UnknownDetector {
        /// Requested name
        name: String,
    },

    /// The detector has no data extension of the requested kind
    MissingExtension {
        /// Detector id
        detector_id: u32,
        /// Requested extension
        expected: &'static str,
    },

    /// The description could not be parsed
    Parse {
        /// Parser message
        description: String,
    },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::UnknownDetector { name } => write!(f, "Unknown detector '{}'", name),
            GeometryError::MissingExtension {
                detector_id,
                expected,
            } => write!(
                f,
                "Detector {} has no {} extension",
                detector_id, expected
            ),
            GeometryError::Parse { description } => {
                write!(f, "Cannot parse geometry: {}", description)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// One layer of a barrel tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZPlanarLayer {
    /// Number of ladders (modules) around the layer
    pub ladder_number: usize,
}

/// One disk of an endcap tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZDiskPetalsLayer {
    /// Number of petals (modules) on the disk
    pub petal_number: usize,
}

/// Query interface of the detector description
pub trait GeometryProvider {
    /// Numeric id of a detector
    fn resolve(&self, name: &str) -> Result<u32, GeometryError>;

    /// Layers of a barrel detector
    fn zplanar_layers(&self, detector_id: u32) -> Result<Vec<ZPlanarLayer>, GeometryError>;

    /// Disks of an endcap detector
    fn zdisk_layers(&self, detector_id: u32) -> Result<Vec<ZDiskPetalsLayer>, GeometryError>;

    /// Magnetic field vector in Tesla
    fn field_at(&self, point: &Point3<f64>) -> Vector3<f64>;
}

/// Layer data attached to a detector description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectorExtension {
    /// Barrel layers
    ZPlanar(Vec<ZPlanarLayer>),
    /// Endcap disks
    ZDiskPetals(Vec<ZDiskPetalsLayer>),
    /// No layer data
    None,
}

/// A named detector in a [`StaticGeometry`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorDescription {
    /// Detector name
    pub name: String,
    /// Numeric id
    pub id: u32,
    /// Layer data
    pub extension: DetectorExtension,
}

/// In-memory detector description with a uniform magnetic field
///
/// ```json
/// {
///   "field": [0.0, 0.0, 3.5],
///   "detectors": [
///     { "name": "InnerTrackerBarrel", "id": 3,
///       "extension": { "zPlanar": [ { "ladderNumber": 32 } ] } }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticGeometry {
    /// Field vector in Tesla
    pub field: [f64; 3],
    /// Known detectors
    pub detectors: Vec<DetectorDescription>,
}

impl StaticGeometry {
    /// Empty geometry with a solenoid field along z
    pub fn new(b_z: f64) -> Self {
        Self {
            field: [0.0, 0.0, b_z],
            detectors: Vec::new(),
        }
    }

    /// Load from JSON
    pub fn from_json_str(json: &str) -> Result<Self, GeometryError> {
        serde_json::from_str(json).map_err(|e| GeometryError::Parse {
            description: e.to_string(),
        })
    }

    /// Add a barrel detector with the given ladder count per layer
    pub fn with_barrel(mut self, name: &str, id: u32, ladders_per_layer: &[usize]) -> Self {
        let layers = ladders_per_layer
            .iter()
            .map(|&ladder_number| ZPlanarLayer { ladder_number })
            .collect();
        self.detectors.push(DetectorDescription {
            name: name.to_string(),
            id,
            extension: DetectorExtension::ZPlanar(layers),
        });
        self
    }

    /// Add an endcap detector with the given petal count per disk
    pub fn with_endcap(mut self, name: &str, id: u32, petals_per_disk: &[usize]) -> Self {
        let layers = petals_per_disk
            .iter()
            .map(|&petal_number| ZDiskPetalsLayer { petal_number })
            .collect();
        self.detectors.push(DetectorDescription {
            name: name.to_string(),
            id,
            extension: DetectorExtension::ZDiskPetals(layers),
        });
        self
    }

    /// Add a detector without layer data
    pub fn with_bare_detector(mut self, name: &str, id: u32) -> Self {
        self.detectors.push(DetectorDescription {
            name: name.to_string(),
            id,
            extension: DetectorExtension::None,
        });
        self
    }

    fn by_id(&self, detector_id: u32) -> Option<&DetectorDescription> {
        self.detectors.iter().find(|d| d.id == detector_id)
    }
}

impl GeometryProvider for StaticGeometry {
    fn resolve(&self, name: &str) -> Result<u32, GeometryError> {
        self.detectors
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.id)
            .ok_or_else(|| GeometryError::UnknownDetector {
                name: name.to_string(),
            })
    }

    fn zplanar_layers(&self, detector_id: u32) -> Result<Vec<ZPlanarLayer>, GeometryError> {
        match self.by_id(detector_id).map(|d| &d.extension) {
            Some(DetectorExtension::ZPlanar(layers)) => Ok(layers.clone()),
            _ => Err(GeometryError::MissingExtension {
                detector_id,
                expected: "z-planar",
            }),
        }
    }

    fn zdisk_layers(&self, detector_id: u32) -> Result<Vec<ZDiskPetalsLayer>, GeometryError> {
        match self.by_id(detector_id).map(|d| &d.extension) {
            Some(DetectorExtension::ZDiskPetals(layers)) => Ok(layers.clone()),
            _ => Err(GeometryError::MissingExtension {
                detector_id,
                expected: "z-disk petals",
            }),
        }
    }

    fn field_at(&self, _point: &Point3<f64>) -> Vector3<f64> {
        Vector3::from(self.field)
    }
}
