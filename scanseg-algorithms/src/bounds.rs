use scanseg_core::cloud::PointCloud;
use scanseg_core::math::AABB;
use scanseg_core::nalgebra::Point3;

/// Calculate the bounding box of the points in the given `cloud`. Returns
/// `None` if the cloud contains zero points
pub fn calculate_bounds(cloud: &PointCloud) -> Option<AABB> {
    let mut positions = cloud.positions();
    let first = positions.next()?;
    let mut bounds = AABB::from_point(Point3::from(*first));
    for position in positions {
        bounds.extend_with_point(&Point3::from(*position));
    }
    Some(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanseg_core::cloud::PointXyzRgb;
    use scanseg_core::nalgebra::Vector3;

    #[test]
    fn bounds_of_empty_cloud() {
        assert!(calculate_bounds(&PointCloud::new()).is_none());
    }

    #[test]
    fn bounds_cover_all_points() {
        let cloud: PointCloud = vec![
            PointXyzRgb::new(1.0, 5.0, -3.0),
            PointXyzRgb::new(-2.0, 0.5, 4.0),
            PointXyzRgb::new(0.0, -1.0, 0.0),
        ]
        .into_iter()
        .collect();
        let bounds = calculate_bounds(&cloud).unwrap();
        assert_eq!(*bounds.min(), Point3::new(-2.0, -1.0, -3.0));
        assert_eq!(*bounds.max(), Point3::new(1.0, 5.0, 4.0));
        assert_eq!(bounds.extent(), Vector3::new(3.0, 6.0, 7.0));
    }
}
