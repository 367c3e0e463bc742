use anyhow::{ensure, Result};
use rand::Rng;
use rayon::prelude::*;
use scanseg_core::cloud::PointCloud;
use scanseg_core::nalgebra::Vector3;

/// Represents a plane in coordinate-form: ax + by + cz + d = 0
/// the ranking shows how many points of the cloud are inliers for this
/// specific plane
#[derive(Debug, Clone)]
pub struct Plane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    ranking: usize,
}

impl Plane {
    /// Number of cloud points within the distance threshold of this plane
    pub fn inlier_count(&self) -> usize {
        self.ranking
    }
}

/// calculates the distance between a point and a plane
fn distance_point_plane(point: &Vector3<f64>, plane: &Plane) -> f64 {
    let d = (plane.a * point.x + plane.b * point.y + plane.c * point.z + plane.d).abs();
    let e = (plane.a * plane.a + plane.b * plane.b + plane.c * plane.c).sqrt();
    d / e
}

/// generates a random plane from three points of the cloud
fn generate_rng_plane(cloud: &PointCloud) -> Plane {
    // choose three unique random points from the cloud
    let mut rng = rand::thread_rng();
    let rand1 = rng.gen_range(0..cloud.len());
    let mut rand2 = rng.gen_range(0..cloud.len());
    while rand1 == rand2 {
        rand2 = rng.gen_range(0..cloud.len());
    }
    let mut rand3 = rng.gen_range(0..cloud.len());
    while rand2 == rand3 || rand1 == rand3 {
        rand3 = rng.gen_range(0..cloud.len());
    }
    let p_a = cloud.points()[rand1].position;
    let p_b = cloud.points()[rand2].position;
    let p_c = cloud.points()[rand3].position;

    // compute plane from the three positions; a collinear sample yields a
    // near-zero normal, whose NaN distances never pass the inlier threshold
    let vec1 = p_b - p_a;
    let vec2 = p_c - p_a;
    let normal = vec1.cross(&vec2);
    let d = -normal.dot(&p_a);
    Plane {
        a: normal.x,
        b: normal.y,
        c: normal.z,
        d,
        ranking: 0,
    }
}

fn generate_plane_model(cloud: &PointCloud, distance_threshold: f64) -> (Plane, Vec<usize>) {
    // generate random plane from three points in the cloud
    let mut curr_hypo = generate_rng_plane(cloud);
    // find all points that belong to the plane
    let mut curr_positions = vec![];
    for (index, p) in cloud.positions().enumerate() {
        let distance = distance_point_plane(p, &curr_hypo);
        if distance < distance_threshold {
            // we found a point that belongs to the plane
            curr_hypo.ranking += 1;
            curr_positions.push(index);
        }
    }
    (curr_hypo, curr_positions)
}

/// Ransac plane segmentation in parallel.
/// Returns the plane with the most inliers across `num_of_iterations` random
/// minimal-sample models, together with the indices of its inliers. A point is
/// an inlier if its distance to the plane is below `distance_threshold`.
///
/// Returns `None` if no model can be found: the cloud has fewer than 3 points,
/// or the best candidate supports fewer than 3 inliers.
pub fn ransac_plane_par(
    cloud: &PointCloud,
    distance_threshold: f64,
    num_of_iterations: usize,
) -> Option<(Plane, Vec<usize>)> {
    if cloud.len() < 3 {
        return None;
    }
    // iterate in parallel over num_of_iterations
    (0..num_of_iterations)
        .into_par_iter()
        .map(|_x| {
            // generate one model for the current iteration
            generate_plane_model(cloud, distance_threshold)
        })
        // get the best plane-model from all iterations (highest ranking)
        .max_by(|(x, _y), (a, _b)| x.ranking.cmp(&a.ranking))
        .filter(|(plane, _)| plane.ranking >= 3)
}

/// Ransac plane segmentation in serial (for maximum speed use
/// [ransac_plane_par]). Identical semantics to the parallel variant.
///
/// ```
/// # use scanseg_core::cloud::{PointCloud, PointXyzRgb};
/// # use scanseg_algorithms::segmentation::ransac_plane_serial;
/// let mut points = vec![];
/// // generate some inliers
/// for i in 0..200 {
///     points.push(PointXyzRgb::new(0.0, f64::from(i), f64::from(i * i)));
/// }
/// // generate an outlier
/// points.push(PointXyzRgb::new(9.0, 0.0, 0.0));
/// let cloud: PointCloud = points.into_iter().collect();
/// let (_plane, indices) = ransac_plane_serial(&cloud, 0.5, 10).unwrap();
/// for i in 0..199 {
///     // inliers are in the plane
///     assert!(indices.contains(&(i as usize)));
/// }
/// // outlier is not in the plane
/// assert!(!indices.contains(&200));
/// ```
pub fn ransac_plane_serial(
    cloud: &PointCloud,
    distance_threshold: f64,
    num_of_iterations: usize,
) -> Option<(Plane, Vec<usize>)> {
    if cloud.len() < 3 {
        return None;
    }
    (0..num_of_iterations)
        .map(|_x| {
            // generate one model for the current iteration
            generate_plane_model(cloud, distance_threshold)
        })
        // get the best plane-model from all iterations (highest ranking)
        .max_by(|(x, _y), (a, _b)| x.ranking.cmp(&a.ranking))
        .filter(|(plane, _)| plane.ranking >= 3)
}

/// Greedily strips up to `num_planes` dominant planes from the cloud.
///
/// Each pass fits the best ransac plane within `max_iterations` trials and
/// removes its inliers before the next pass, so successive fits operate on the
/// already-stripped cloud. The loop stops early when no model is found, or
/// when `min_remaining_ratio` is enabled (non-negative) and the fraction of
/// surviving points drops below it.
///
/// Returns the stripped cloud and the number of planes actually removed.
///
/// Errors if `distance_threshold` is not positive or `max_iterations` is zero.
pub fn remove_planes(
    cloud: PointCloud,
    distance_threshold: f64,
    max_iterations: usize,
    num_planes: usize,
    min_remaining_ratio: f64,
) -> Result<(PointCloud, usize)> {
    ensure!(
        distance_threshold > 0.0,
        "plane distance threshold must be positive, got {}",
        distance_threshold
    );
    ensure!(max_iterations >= 1, "max_iterations must be at least 1");

    let original_len = cloud.len();
    let mut current = cloud;
    let mut removed = 0;
    for _ in 0..num_planes {
        let (_plane, inliers) =
            match ransac_plane_par(&current, distance_threshold, max_iterations) {
                Some(model) => model,
                None => break,
            };
        current = current.without_indices(&inliers);
        removed += 1;
        if min_remaining_ratio >= 0.0
            && (current.len() as f64) < min_remaining_ratio * original_len as f64
        {
            break;
        }
    }
    Ok((current, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanseg_core::cloud::PointXyzRgb;

    fn setup_point_cloud() -> PointCloud {
        // a dominant plane at z = 1 with a sparse column of points off it
        (2..2002)
            .map(|p| {
                if p % 5 == 0 {
                    PointXyzRgb::new(0.0, 0.0, (p * p) as f64)
                } else {
                    PointXyzRgb::new(p as f64, (p * p) as f64, 1.0)
                }
            })
            .collect()
    }

    #[test]
    fn test_ransac_plane_par() {
        let cloud = setup_point_cloud();
        let (_plane, indices) = ransac_plane_par(&cloud, 0.1, 300).unwrap();
        assert_eq!(indices.len(), 1600);
        for i in 0..2000 {
            if (i + 2) % 5 != 0 {
                assert!(indices.contains(&i));
            }
        }
    }

    #[test]
    fn test_ransac_plane_serial() {
        let cloud = setup_point_cloud();
        let (_plane, indices) = ransac_plane_serial(&cloud, 0.1, 300).unwrap();
        assert_eq!(indices.len(), 1600);
        for i in 0..2000 {
            if (i + 2) % 5 != 0 {
                assert!(indices.contains(&i));
            }
        }
    }

    #[test]
    fn no_model_on_tiny_clouds() {
        let cloud: PointCloud = vec![
            PointXyzRgb::new(0.0, 0.0, 0.0),
            PointXyzRgb::new(1.0, 0.0, 0.0),
        ]
        .into_iter()
        .collect();
        assert!(ransac_plane_serial(&cloud, 0.1, 50).is_none());
        assert!(ransac_plane_par(&cloud, 0.1, 50).is_none());
    }

    #[test]
    fn remove_planes_strips_inliers_greedily() {
        let cloud = setup_point_cloud();
        let input_len = cloud.len();
        let (rest, removed) = remove_planes(cloud, 0.1, 300, 1, -1.0).unwrap();
        assert_eq!(removed, 1);
        // monotonic shrink: removed-point count equals the plane's inliers
        assert_eq!(rest.len(), input_len - 1600);
        assert!(rest.positions().all(|p| p.z != 1.0));
    }

    #[test]
    fn remove_planes_strips_multiple_planes_greedily() {
        // two exact parallel planes of 500 and 300 points, plus 20 scattered
        // points that belong to neither
        let mut cloud = PointCloud::new();
        for i in 0..500 {
            cloud.push(PointXyzRgb::new((i % 25) as f64 * 0.1, (i / 25) as f64 * 0.1, 0.0));
        }
        for i in 0..300 {
            cloud.push(PointXyzRgb::new((i % 20) as f64 * 0.1, (i / 20) as f64 * 0.1, 1.0));
        }
        for i in 0..20 {
            cloud.push(PointXyzRgb::new(
                i as f64 * 3.7,
                (i * i) as f64 * 1.3,
                5.0 + i as f64 * 2.0,
            ));
        }
        let (rest, removed) = remove_planes(cloud, 0.01, 300, 2, -1.0).unwrap();
        assert_eq!(removed, 2);
        // the removed-point count is the sum of both planes' inliers
        assert_eq!(rest.len(), 20);
        assert!(rest.positions().all(|p| p.z >= 5.0));
    }

    #[test]
    fn remove_planes_stops_when_no_model_is_left() {
        let cloud = setup_point_cloud();
        // asking for far more planes than the cloud holds must not loop or panic
        let (rest, removed) = remove_planes(cloud, 0.1, 300, 50, -1.0).unwrap();
        assert!(removed < 50);
        assert!(rest.len() < 3 || removed > 0);
    }

    #[test]
    fn remove_planes_honors_remaining_ratio() {
        let cloud = setup_point_cloud();
        // first plane strips 80% of the points, dropping below the 0.5 ratio
        let (_rest, removed) = remove_planes(cloud, 0.1, 300, 10, 0.5).unwrap();
        assert_eq!(removed, 1);
    }

    #[test]
    fn remove_planes_rejects_invalid_parameters() {
        assert!(remove_planes(setup_point_cloud(), 0.0, 10, 1, -1.0).is_err());
        assert!(remove_planes(setup_point_cloud(), 0.1, 0, 1, -1.0).is_err());
    }
}
