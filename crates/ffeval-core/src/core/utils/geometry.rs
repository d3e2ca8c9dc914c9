use nalgebra::{Matrix3, Point3, Vector3};

/// A (possibly triclinic) periodic cell whose box vectors are the rows of `vectors`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicBox {
    vectors: Matrix3<f64>,
    reciprocal: Matrix3<f64>,
    volume: f64,
}

impl PeriodicBox {
    /// Returns `None` for left-handed or degenerate box vectors.
    pub fn new(vectors: Matrix3<f64>) -> Option<Self> {
        let volume = vectors.determinant();
        if !volume.is_finite() || volume <= 1e-12 {
            return None;
        }
        let reciprocal = vectors.try_inverse()?;
        Some(Self {
            vectors,
            reciprocal,
            volume,
        })
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    #[inline]
    pub fn vectors(&self) -> &Matrix3<f64> {
        &self.vectors
    }

    /// The inverse of the box matrix; its columns are the reciprocal lattice vectors.
    #[inline]
    pub fn reciprocal(&self) -> &Matrix3<f64> {
        &self.reciprocal
    }

    /// The distance between opposite faces of the cell along each reciprocal direction.
    pub fn perpendicular_widths(&self) -> [f64; 3] {
        [0, 1, 2].map(|axis| 1.0 / self.reciprocal.column(axis).norm())
    }

    #[inline]
    pub fn fractional(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.reciprocal.transpose() * position
    }

    #[inline]
    pub fn cartesian(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.vectors.transpose() * fractional
    }

    /// Fractional coordinates of a point folded back into `[0, 1)`.
    pub fn wrapped_fractional(&self, position: &Point3<f64>) -> Vector3<f64> {
        self.fractional(&position.coords)
            .map(|s| s - s.floor())
            .map(|s| if s >= 1.0 { 0.0 } else { s })
    }

    /// The periodic image of `delta` closest to the origin. Exact for any displacement
    /// shorter than half the smallest perpendicular width.
    pub fn minimum_image(&self, delta: &Vector3<f64>) -> Vector3<f64> {
        let fractional = self.fractional(delta).map(|s| s - s.round());
        self.cartesian(&fractional)
    }
}

pub fn bond_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let v_ba = a - b;
    let v_bc = c - b;
    v_ba.angle(&v_bc)
}

pub fn dihedral_angle(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    let b1 = b - a;
    let b2 = c - b;
    let b3 = d - c;

    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);

    let y = n1.cross(&n2).dot(&b2) / b2.norm();
    let x = n1.dot(&n2);
    y.atan2(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn cubic_box_has_expected_volume_and_widths() {
        let cell = PeriodicBox::new(Matrix3::from_diagonal_element(10.0)).unwrap();
        assert!(f64_approx_equal(cell.volume(), 1000.0));
        for width in cell.perpendicular_widths() {
            assert!(f64_approx_equal(width, 10.0));
        }
    }

    #[test]
    fn degenerate_box_is_rejected() {
        let flat = Matrix3::new(10.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0);
        assert!(PeriodicBox::new(flat).is_none());
    }

    #[test]
    fn triclinic_box_widths_are_shorter_than_vector_lengths() {
        let vectors = Matrix3::new(10.0, 0.0, 0.0, 5.0, 8.660254, 0.0, 0.0, 0.0, 12.0);
        let cell = PeriodicBox::new(vectors).unwrap();
        let widths = cell.perpendicular_widths();
        assert!(widths[0] < 10.0);
        assert!((widths[1] - 8.660254).abs() < 1e-6);
        assert!(f64_approx_equal(widths[2], 12.0));
    }

    #[test]
    fn minimum_image_folds_displacement_into_nearest_image() {
        let cell = PeriodicBox::new(Matrix3::from_diagonal_element(10.0)).unwrap();
        let delta = cell.minimum_image(&Vector3::new(9.0, -6.0, 0.5));
        assert!(f64_approx_equal(delta.x, -1.0));
        assert!(f64_approx_equal(delta.y, 4.0));
        assert!(f64_approx_equal(delta.z, 0.5));
    }

    #[test]
    fn wrapped_fractional_coordinates_lie_in_unit_interval() {
        let cell = PeriodicBox::new(Matrix3::from_diagonal_element(4.0)).unwrap();
        let s = cell.wrapped_fractional(&Point3::new(-1.0, 9.0, 4.0));
        assert!(f64_approx_equal(s.x, 0.75));
        assert!(f64_approx_equal(s.y, 0.25));
        assert!(f64_approx_equal(s.z, 0.0));
    }

    #[test]
    fn bond_angle_of_right_angle_is_half_pi() {
        let angle = bond_angle(
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::origin(),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert!(f64_approx_equal(angle, FRAC_PI_2));
    }

    #[test]
    fn dihedral_angle_distinguishes_cis_and_trans() {
        let b = Point3::new(0.0, 0.0, 0.0);
        let c = Point3::new(1.0, 0.0, 0.0);
        let a = Point3::new(0.0, 1.0, 0.0);
        let cis = dihedral_angle(&a, &b, &c, &Point3::new(1.0, 1.0, 0.0));
        let trans = dihedral_angle(&a, &b, &c, &Point3::new(1.0, -1.0, 0.0));
        assert!(f64_approx_equal(cis, 0.0));
        assert!(f64_approx_equal(trans.abs(), PI));
    }

    #[test]
    fn dihedral_angle_of_perpendicular_planes_is_half_pi() {
        let phi = dihedral_angle(
            &Point3::new(0.0, 1.0, 0.0),
            &Point3::origin(),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 1.0),
        );
        assert!(f64_approx_equal(phi.abs(), FRAC_PI_2));
    }
}
