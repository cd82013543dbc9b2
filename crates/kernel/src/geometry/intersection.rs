use super::Point3d;

/// Point on `a`-`b` at which the signed distance interpolates to zero.
///
/// The caller guarantees `da` and `db` differ.
pub fn interpolate_by_distance(a: &Point3d, da: f64, b: &Point3d, db: f64) -> Point3d {
    let t = da / (da - db);
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_by_distance() {
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(4.0, 4.0, 0.0);
        // signed distances against the plane x = 1
        let hit = interpolate_by_distance(&a, -1.0, &b, 3.0);
        assert!((hit - Point3d::new(1.0, 1.0, 0.0)).norm() < 1e-12);
        assert_eq!(interpolate_by_distance(&a, 0.0, &b, 2.0), a);
    }
}
