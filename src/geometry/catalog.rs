//! Per-run geometry catalog
//!
//! Built once at the start of a run from the detector description, then only
//! read. Holds, for every configured subdetector, its id, shape and the number
//! of modules on each layer, plus the field value handed to the fit engine.

use nalgebra::Point3;

use super::provider::{GeometryError, GeometryProvider};

/// Layout class of a tracking subdetector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorShape {
    /// Cylindrical layers of ladders
    Barrel,
    /// Disks of petals
    Endcap,
}

impl DetectorShape {
    /// Classify a subdetector by its name (`"...Barrel..."` is a barrel)
    pub fn from_name(name: &str) -> Self {
        if name.contains("Barrel") {
            DetectorShape::Barrel
        } else {
            DetectorShape::Endcap
        }
    }
}

/// Geometry of one configured subdetector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdetectorLayout {
    /// Configured name
    pub name: String,
    /// Numeric detector id (0 when it could not be resolved)
    pub id: u32,
    /// Barrel or endcap
    pub shape: DetectorShape,
    /// Module count per layer; its length is the layer count
    pub modules_per_layer: Vec<usize>,
}

impl SubdetectorLayout {
    fn unresolved(name: &str, shape: DetectorShape) -> Self {
        Self {
            name: name.to_string(),
            id: 0,
            shape,
            modules_per_layer: Vec::new(),
        }
    }

    /// Number of layers (0 disables the subdetector)
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.modules_per_layer.len()
    }

    /// Module count of a layer, 0 if unknown
    #[inline]
    pub fn modules_on_layer(&self, layer: usize) -> usize {
        self.modules_per_layer.get(layer).copied().unwrap_or(0)
    }
}

/// Subdetector layouts and field value for a run
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryCatalog {
    subdetectors: Vec<SubdetectorLayout>,
    b_field: f64,
}

impl GeometryCatalog {
    /// Build the catalog for the given subdetector names, in order.
    ///
    /// Subdetectors whose description cannot be read are kept with zero layers
    /// so that the extrapolation skips them; the failure is only logged.
    pub fn load<G: GeometryProvider + ?Sized>(geometry: &G, subdetector_names: &[String]) -> Self {
        let b_field = geometry.field_at(&Point3::origin()).z;
        log::debug!("Magnetic field at origin: {} T", b_field);

        let subdetectors = subdetector_names
            .iter()
            .map(|name| {
                let shape = DetectorShape::from_name(name);
                match Self::load_layout(geometry, name, shape) {
                    Ok(layout) => {
                        log::debug!(
                            "Subdetector {} (id {}, {:?}): {} layers, modules per layer {:?}",
                            layout.name,
                            layout.id,
                            layout.shape,
                            layout.num_layers(),
                            layout.modules_per_layer
                        );
                        layout
                    }
                    Err(e) => {
                        log::warn!(
                            "Cannot read module counts of subdetector {}: {}; it will be skipped",
                            name,
                            e
                        );
                        SubdetectorLayout::unresolved(name, shape)
                    }
                }
            })
            .collect();

        Self {
            subdetectors,
            b_field,
        }
    }

    fn load_layout<G: GeometryProvider + ?Sized>(
        geometry: &G,
        name: &str,
        shape: DetectorShape,
    ) -> Result<SubdetectorLayout, GeometryError> {
        let id = geometry.resolve(name)?;
        let modules_per_layer = match shape {
            DetectorShape::Barrel => geometry
                .zplanar_layers(id)?
                .iter()
                .map(|l| l.ladder_number)
                .collect(),
            DetectorShape::Endcap => geometry
                .zdisk_layers(id)?
                .iter()
                .map(|l| l.petal_number)
                .collect(),
        };
        Ok(SubdetectorLayout {
            name: name.to_string(),
            id,
            shape,
            modules_per_layer,
        })
    }

    /// Field z-component at the origin, in Tesla
    #[inline]
    pub fn b_field(&self) -> f64 {
        self.b_field
    }

    /// Layouts in configured order
    #[inline]
    pub fn subdetectors(&self) -> &[SubdetectorLayout] {
        &self.subdetectors
    }

    /// Layout of the `index`-th configured subdetector
    #[inline]
    pub fn subdetector(&self, index: usize) -> Option<&SubdetectorLayout> {
        self.subdetectors.get(index)
    }

    /// Number of configured subdetectors
    #[inline]
    pub fn len(&self) -> usize {
        self.subdetectors.len()
    }

    /// Whether no subdetector is configured
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subdetectors.is_empty()
    }
}
