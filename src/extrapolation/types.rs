//! Track, track state and hit types
//!
//! Helix parameters follow the perigee convention `(d0, phi, omega, z0, tanλ)`
//! with lengths in millimetres. The curvature `omega` is signed; its magnitude
//! is inversely proportional to the transverse momentum.

use nalgebra::{Matrix5, Point3, Vector3, Vector5};

use crate::common::DetectorElementId;

/// Index of `d0` in the helix parameter vector
pub const D0: usize = 0;
/// Index of `phi` in the helix parameter vector
pub const PHI: usize = 1;
/// Index of `omega` in the helix parameter vector
pub const OMEGA: usize = 2;
/// Index of `z0` in the helix parameter vector
pub const Z0: usize = 3;
/// Index of `tanλ` in the helix parameter vector
pub const TAN_LAMBDA: usize = 4;

/// Number of entries in a packed lower-triangle 5×5 covariance
pub const PACKED_COVARIANCE_LEN: usize = 15;

/// Speed of light factor converting `B[T] / omega[1/mm]` into `pt[GeV]`
const PT_CONVERSION: f64 = 2.99792458e-4;

/// Helix state: parameters, covariance and reference point
#[derive(Debug, Clone, PartialEq)]
pub struct TrackState {
    /// `(d0, phi, omega, z0, tanλ)`
    pub parameters: Vector5<f64>,
    /// Symmetric parameter covariance
    pub covariance: Matrix5<f64>,
    /// Point the parameters are expressed relative to
    pub reference_point: Point3<f64>,
}

impl TrackState {
    /// Create a new track state
    pub fn new(
        parameters: Vector5<f64>,
        covariance: Matrix5<f64>,
        reference_point: Point3<f64>,
    ) -> Self {
        Self {
            parameters,
            covariance,
            reference_point,
        }
    }

    /// Create a state from a covariance stored as a packed lower triangle
    /// (row-major: `c00, c10, c11, c20, c21, c22, ...`).
    pub fn from_packed(
        parameters: Vector5<f64>,
        packed: &[f64; PACKED_COVARIANCE_LEN],
        reference_point: Point3<f64>,
    ) -> Self {
        Self::new(parameters, unpack_covariance(packed), reference_point)
    }

    /// Transverse impact parameter
    #[inline]
    pub fn d0(&self) -> f64 {
        self.parameters[D0]
    }

    /// Azimuth at the point of closest approach
    #[inline]
    pub fn phi(&self) -> f64 {
        self.parameters[PHI]
    }

    /// Signed curvature
    #[inline]
    pub fn omega(&self) -> f64 {
        self.parameters[OMEGA]
    }

    /// Longitudinal impact parameter
    #[inline]
    pub fn z0(&self) -> f64 {
        self.parameters[Z0]
    }

    /// Tangent of the dip angle
    #[inline]
    pub fn tan_lambda(&self) -> f64 {
        self.parameters[TAN_LAMBDA]
    }

    /// One-sigma uncertainty of a parameter; zero for non-positive variances.
    #[inline]
    pub fn sigma(&self, index: usize) -> f64 {
        self.covariance[(index, index)].max(0.0).sqrt()
    }

    /// Covariance as a packed lower triangle
    pub fn packed_covariance(&self) -> [f64; PACKED_COVARIANCE_LEN] {
        let mut packed = [0.0; PACKED_COVARIANCE_LEN];
        let mut k = 0;
        for i in 0..5 {
            for j in 0..=i {
                packed[k] = self.covariance[(i, j)];
                k += 1;
            }
        }
        packed
    }

    /// Transverse momentum in GeV for a solenoid field of `b_field` Tesla.
    ///
    /// Returns infinity for a straight track.
    pub fn transverse_momentum(&self, b_field: f64) -> f64 {
        if self.omega() == 0.0 {
            f64::INFINITY
        } else {
            PT_CONVERSION * b_field.abs() / self.omega().abs()
        }
    }
}

/// Expand a packed lower triangle into a symmetric 5×5 matrix
pub fn unpack_covariance(packed: &[f64; PACKED_COVARIANCE_LEN]) -> Matrix5<f64> {
    let mut covariance = Matrix5::zeros();
    let mut k = 0;
    for i in 0..5 {
        for j in 0..=i {
            covariance[(i, j)] = packed[k];
            covariance[(j, i)] = packed[k];
            k += 1;
        }
    }
    covariance
}

/// Identifier of a hit, unique within an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HitId(pub u64);

/// A planar silicon hit
///
/// The measurement plane is spanned by `u` (precise direction) and `v`, with
/// single point resolutions `du` and `dv`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerHit {
    /// Identifier unique within the event
    pub id: HitId,
    /// Full 64-bit cell identifier
    pub cell_id: u64,
    /// Measured position
    pub position: Point3<f64>,
    /// Precise measurement direction
    pub u: Vector3<f64>,
    /// Second measurement direction
    pub v: Vector3<f64>,
    /// Resolution along `u`
    pub du: f64,
    /// Resolution along `v`
    pub dv: f64,
}

impl TrackerHit {
    /// Default resolution along `u` (mm)
    pub const DEFAULT_DU: f64 = 0.007;
    /// Default resolution along `v` (mm)
    pub const DEFAULT_DV: f64 = 0.05;

    /// Create a hit whose measurement plane is tangent to a cylinder around
    /// the beam axis (`u` along the azimuth, `v` along z).
    pub fn new(id: HitId, cell_id: u64, position: Point3<f64>) -> Self {
        let phi = position.y.atan2(position.x);
        Self {
            id,
            cell_id,
            position,
            u: Vector3::new(-phi.sin(), phi.cos(), 0.0),
            v: Vector3::z(),
            du: Self::DEFAULT_DU,
            dv: Self::DEFAULT_DV,
        }
    }

    /// Override the measurement plane and resolutions
    pub fn with_plane(mut self, u: Vector3<f64>, v: Vector3<f64>, du: f64, dv: f64) -> Self {
        self.u = u;
        self.v = v;
        self.du = du;
        self.dv = dv;
        self
    }

    /// Detector element the hit lies on
    #[inline]
    pub fn element_id(&self) -> DetectorElementId {
        DetectorElementId::from_cell_id(self.cell_id)
    }

    /// Distance from the beam axis
    #[inline]
    pub fn radius(&self) -> f64 {
        self.position.x.hypot(self.position.y)
    }
}

/// Sort hits by increasing distance from the beam axis
pub fn sort_by_radius(hits: &mut [TrackerHit]) {
    hits.sort_by(|a, b| a.radius().total_cmp(&b.radius()));
}

/// Seed track from the inner detector
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Helix state at the reference point
    pub state: TrackState,
    /// Hits the track was built from
    pub hits: Vec<TrackerHit>,
}

impl Track {
    /// Create a new seed track
    pub fn new(state: TrackState, hits: Vec<TrackerHit>) -> Self {
        Self { state, hits }
    }

    /// Absolute curvature, the inverse transverse momentum proxy
    #[inline]
    pub fn abs_omega(&self) -> f64 {
        self.state.omega().abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_covariance_layout() {
        let packed: [f64; 15] = std::array::from_fn(|k| k as f64 + 1.0);
        let state = TrackState::from_packed(Vector5::zeros(), &packed, Point3::origin());

        assert_eq!(state.covariance[(0, 0)], 1.0);
        assert_eq!(state.covariance[(1, 1)], 3.0);
        assert_eq!(state.covariance[(2, 2)], 6.0);
        assert_eq!(state.covariance[(3, 3)], 10.0);
        assert_eq!(state.covariance[(4, 4)], 15.0);
        assert_eq!(state.covariance[(3, 1)], state.covariance[(1, 3)]);
        assert_eq!(state.packed_covariance(), packed);
    }

    #[test]
    fn test_sigma_clamps_negative_variance() {
        let mut covariance = Matrix5::identity() * 4.0;
        covariance[(Z0, Z0)] = -1.0;
        let state = TrackState::new(Vector5::zeros(), covariance, Point3::origin());
        assert!((state.sigma(D0) - 2.0).abs() < 1e-12);
        assert_eq!(state.sigma(Z0), 0.0);
    }

    #[test]
    fn test_transverse_momentum() {
        let state = TrackState::new(
            Vector5::new(0.0, 0.0, 1e-3, 0.0, 0.0),
            Matrix5::identity(),
            Point3::origin(),
        );
        // 1 GeV/c in 3.5 T ≈ 1.05e-3 / mm curvature
        assert!((state.transverse_momentum(3.5) - 1.0493).abs() < 1e-3);

        let straight = TrackState::new(Vector5::zeros(), Matrix5::identity(), Point3::origin());
        assert!(straight.transverse_momentum(3.5).is_infinite());
    }

    #[test]
    fn test_sort_by_radius() {
        let mut hits = vec![
            TrackerHit::new(HitId(0), 1, Point3::new(30.0, 40.0, 5.0)),
            TrackerHit::new(HitId(1), 1, Point3::new(0.0, 10.0, 100.0)),
            TrackerHit::new(HitId(2), 1, Point3::new(-20.0, 0.0, 0.0)),
        ];
        sort_by_radius(&mut hits);
        let ids: Vec<u64> = hits.iter().map(|h| h.id.0).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert!((hits[2].radius() - 50.0).abs() < 1e-12);
    }
}
