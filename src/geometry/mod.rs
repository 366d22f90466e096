//! Detector geometry: the query interface and the per-run catalog
//!
//! - [`provider`] - [`GeometryProvider`] trait and in-memory [`StaticGeometry`]
//! - [`catalog`] - [`GeometryCatalog`] built once per run

pub mod catalog;
pub mod provider;

pub use catalog::{DetectorShape, GeometryCatalog, SubdetectorLayout};
pub use provider::{
    DetectorDescription, DetectorExtension, GeometryError, GeometryProvider, StaticGeometry,
    ZDiskPetalsLayer, ZPlanarLayer,
};
