use scanseg_core::cloud::PointCloud;
use scanseg_core::nalgebra::Vector3;

/// The coordinate axis a pass-through filter constrains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn component(self, position: &Vector3<f64>) -> f64 {
        match self {
            Axis::X => position.x,
            Axis::Y => position.y,
            Axis::Z => position.z,
        }
    }
}

/// Keeps only the points whose coordinate on `axis` lies within the closed
/// interval spanned by the two bounds. The bounds may be given in either
/// order. Applying the filter once per axis intersects three slabs into a box.
///
/// ```
/// # use scanseg_core::cloud::{PointCloud, PointXyzRgb};
/// # use scanseg_algorithms::pass_through::{pass_through, Axis};
/// let cloud: PointCloud = (0..10).map(|i| PointXyzRgb::new(i as f64, 0.0, 0.0)).collect();
/// let filtered = pass_through(&cloud, Axis::X, 6.5, 2.0);
/// assert_eq!(filtered.len(), 5); // x in {2, 3, 4, 5, 6}
/// ```
pub fn pass_through(cloud: &PointCloud, axis: Axis, lower: f64, upper: f64) -> PointCloud {
    let low = lower.min(upper);
    let high = lower.max(upper);
    cloud
        .iter()
        .filter(|p| {
            let v = axis.component(&p.position);
            v >= low && v <= high
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanseg_core::cloud::PointXyzRgb;

    fn line_along(axis: Axis) -> PointCloud {
        (0..20)
            .map(|i| {
                let v = i as f64 * 0.5;
                match axis {
                    Axis::X => PointXyzRgb::new(v, 0.0, 0.0),
                    Axis::Y => PointXyzRgb::new(0.0, v, 0.0),
                    Axis::Z => PointXyzRgb::new(0.0, 0.0, v),
                }
            })
            .collect()
    }

    #[test]
    fn survivors_lie_inside_the_interval() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let cloud = line_along(axis);
            let filtered = pass_through(&cloud, axis, 1.0, 4.0);
            assert!(!filtered.is_empty());
            for p in &filtered {
                let v = axis.component(&p.position);
                assert!((1.0..=4.0).contains(&v));
            }
            // removed points all lie outside
            let removed = cloud.len() - filtered.len();
            let outside = cloud
                .iter()
                .filter(|p| {
                    let v = axis.component(&p.position);
                    !(1.0..=4.0).contains(&v)
                })
                .count();
            assert_eq!(removed, outside);
        }
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        let cloud = line_along(Axis::Z);
        let filtered = pass_through(&cloud, Axis::Z, 0.5, 1.0);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn swapped_bounds_behave_identically() {
        let cloud = line_along(Axis::X);
        assert_eq!(
            pass_through(&cloud, Axis::X, 1.0, 4.0),
            pass_through(&cloud, Axis::X, 4.0, 1.0)
        );
    }
}
