//! 2x3 affine matrices in pixel coordinates.
//!
//! A matrix maps a point `(x, y)` to:
//!
//! ```text
//! x' = a * x + b * y + tx
//! y' = c * x + d * y + ty
//! ```

/// A 2D affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    pub a: f64,
    pub b: f64,
    pub tx: f64,
    pub c: f64,
    pub d: f64,
    pub ty: f64,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            tx: 0.0,
            c: 0.0,
            d: 1.0,
            ty: 0.0,
        }
    }

    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            tx,
            c: 0.0,
            d: 1.0,
            ty,
        }
    }

    /// Rotation about `center` by `angle_degrees`.
    ///
    /// Follows the OpenCV convention for image coordinates (y down): a
    /// positive angle turns content counter-clockwise as displayed.
    ///
    /// ```text
    /// |  alpha  beta  (1 - alpha) * cx - beta * cy |
    /// | -beta   alpha  beta * cx + (1 - alpha) * cy |
    /// ```
    pub fn rotation_about(center: (f64, f64), angle_degrees: f64) -> Self {
        let (beta, alpha) = sin_cos_degrees(angle_degrees);
        let (cx, cy) = center;

        Self {
            a: alpha,
            b: beta,
            tx: (1.0 - alpha) * cx - beta * cy,
            c: -beta,
            d: alpha,
            ty: beta * cx + (1.0 - alpha) * cy,
        }
    }

    /// Uniform scale about `center`.
    pub fn scale_about(center: (f64, f64), factor: f64) -> Self {
        let (cx, cy) = center;
        Self {
            a: factor,
            b: 0.0,
            tx: (1.0 - factor) * cx,
            c: 0.0,
            d: factor,
            ty: (1.0 - factor) * cy,
        }
    }

    /// Compose: apply `self` first, then `next`.
    pub fn then(&self, next: &Affine2) -> Affine2 {
        Affine2 {
            a: next.a * self.a + next.b * self.c,
            b: next.a * self.b + next.b * self.d,
            tx: next.a * self.tx + next.b * self.ty + next.tx,
            c: next.c * self.a + next.d * self.c,
            d: next.c * self.b + next.d * self.d,
            ty: next.c * self.tx + next.d * self.ty + next.ty,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or `None` if the matrix is singular.
    ///
    /// Singularity is judged relative to the size of the linear part, so
    /// scaling a matrix uniformly never changes the answer.
    pub fn invert(&self) -> Option<Affine2> {
        let det = self.determinant();
        let magnitude = (self.a.abs() + self.b.abs()) * (self.c.abs() + self.d.abs());
        if !det.is_finite() || det == 0.0 || det.abs() <= f64::EPSILON * magnitude {
            return None;
        }
        let inv = 1.0 / det;

        let a = self.d * inv;
        let b = -self.b * inv;
        let c = -self.c * inv;
        let d = self.a * inv;
        Some(Affine2 {
            a,
            b,
            tx: -(a * self.tx + b * self.ty),
            c,
            d,
            ty: -(c * self.tx + d * self.ty),
        })
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.b * y + self.tx,
            self.c * x + self.d * y + self.ty,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

/// `(sin, cos)` of an angle in degrees, exact at multiples of 90.
fn sin_cos_degrees(angle_degrees: f64) -> (f64, f64) {
    let turn = angle_degrees.rem_euclid(360.0);
    if turn == 0.0 {
        (0.0, 1.0)
    } else if turn == 90.0 {
        (1.0, 0.0)
    } else if turn == 180.0 {
        (0.0, -1.0)
    } else if turn == 270.0 {
        (-1.0, 0.0)
    } else {
        angle_degrees.to_radians().sin_cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-9 && (actual.1 - expected.1).abs() < 1e-9,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_identity() {
        let m = Affine2::identity();
        assert!(m.is_identity());
        assert_point(m.apply(3.0, -2.0), (3.0, -2.0));
    }

    #[test]
    fn test_rotation_is_counter_clockwise_on_screen() {
        // y grows downward, so "up" on screen is -y
        let m = Affine2::rotation_about((0.0, 0.0), 90.0);
        assert_point(m.apply(1.0, 0.0), (0.0, -1.0));
        assert_point(m.apply(0.0, -1.0), (-1.0, 0.0));
    }

    #[test]
    fn test_rotation_keeps_center_fixed() {
        let m = Affine2::rotation_about((49.5, 49.5), 37.0);
        assert_point(m.apply(49.5, 49.5), (49.5, 49.5));
    }

    #[test]
    fn test_scale_about_center() {
        let m = Affine2::scale_about((10.0, 10.0), 2.0);
        assert_point(m.apply(10.0, 10.0), (10.0, 10.0));
        assert_point(m.apply(11.0, 10.0), (12.0, 10.0));
    }

    #[test]
    fn test_then_applies_in_order() {
        let shift = Affine2::translation(5.0, 0.0);
        let double = Affine2::scale_about((0.0, 0.0), 2.0);

        // shift first: (1 + 5) * 2 = 12
        assert_point(shift.then(&double).apply(1.0, 0.0), (12.0, 0.0));
        // double first: 1 * 2 + 5 = 7
        assert_point(double.then(&shift).apply(1.0, 0.0), (7.0, 0.0));
    }

    #[test]
    fn test_invert_round_trip() {
        let m = Affine2::rotation_about((3.0, 4.0), 25.0)
            .then(&Affine2::translation(-7.0, 2.5))
            .then(&Affine2::scale_about((1.0, 1.0), 0.8));
        let inv = m.invert().unwrap();

        let (x, y) = m.apply(12.0, -3.0);
        assert_point(inv.apply(x, y), (12.0, -3.0));
        assert_point(m.then(&inv).apply(4.0, 9.0), (4.0, 9.0));
    }

    #[test]
    fn test_invert_singular() {
        let m = Affine2::scale_about((0.0, 0.0), 0.0);
        assert!(m.invert().is_none());
    }

    #[test]
    fn test_quarter_turns_are_exact() {
        let m = Affine2::rotation_about((3.0, 3.0), 90.0);
        assert_eq!((m.a, m.b, m.c, m.d), (0.0, 1.0, -1.0, 0.0));
        assert_eq!(m.apply(5.0, 3.0), (3.0, 1.0));

        let half = Affine2::rotation_about((0.0, 0.0), -180.0);
        assert_eq!((half.a, half.b, half.c, half.d), (-1.0, 0.0, 0.0, -1.0));

        assert_eq!(
            Affine2::rotation_about((4.5, 2.0), 450.0),
            Affine2::rotation_about((4.5, 2.0), 90.0)
        );
        assert!(Affine2::rotation_about((1.0, 1.0), 360.0).is_identity());
        assert_eq!(Affine2::rotation_about((0.0, 0.0), -90.0).b, -1.0);
    }

    #[test]
    fn test_invert_tiny_scale() {
        let tiny = Affine2::scale_about((50.0, 50.0), 1e-9);
        let inv = tiny.invert().unwrap();
        assert!((inv.a / 1e9 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invert_ignores_uniform_scale() {
        let dense = Affine2 {
            a: 32.0,
            b: 0.0,
            tx: 15.5,
            c: 0.0,
            d: 32.0,
            ty: 15.5,
        };
        for factor in [1e-8, 3e-9, 1e-12] {
            let native = Affine2::scale_about((10.0, 10.0), factor);
            assert_eq!(
                native.invert().is_some(),
                native.then(&dense).invert().is_some()
            );
            assert!(native.invert().is_some());
        }
    }

    #[test]
    fn test_invert_rank_deficient() {
        let squash = Affine2 {
            a: 1.0,
            b: 2.0,
            tx: 0.0,
            c: 2.0,
            d: 4.0,
            ty: 0.0,
        };
        assert!(squash.invert().is_none());
    }

    #[test]
    fn test_translations_add() {
        let m = Affine2::translation(1.5, 0.0).then(&Affine2::translation(2.25, 0.0));
        assert_eq!(m, Affine2::translation(3.75, 0.0));
    }
}
