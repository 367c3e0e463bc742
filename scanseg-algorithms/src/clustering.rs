use anyhow::{ensure, Result};
use kd_tree::{KdPoint, KdTree};
use scanseg_core::cloud::PointCloud;

/// A cloud point together with its index in the source cloud, so that radius
/// queries can report indices back
struct IndexedPoint {
    position: [f64; 3],
    index: usize,
}

impl KdPoint for IndexedPoint {
    type Scalar = f64;
    type Dim = typenum::U3;
    fn at(&self, k: usize) -> f64 {
        self.position[k]
    }
}

/// Partitions the cloud into spatially contiguous clusters: two points are
/// neighbors if their distance is within `tolerance`, and a cluster is a
/// connected component of the neighbor relation (Euclidean region growing).
///
/// Components whose cardinality falls outside `[min_size, max_size]` are
/// discarded. The surviving clusters are returned as index sets into the
/// source cloud, ordered by descending size, so index 0 is always the largest
/// surviving cluster. An empty result is a legitimate outcome (for instance
/// when `max_size < min_size`); selecting a cluster from it is the caller's
/// responsibility.
///
/// Errors if `tolerance` is not strictly positive or `min_size` is zero.
///
/// ```
/// # use scanseg_core::cloud::{PointCloud, PointXyzRgb};
/// # use scanseg_algorithms::clustering::euclidean_clusters;
/// let mut cloud = PointCloud::new();
/// for i in 0..30 {
///     cloud.push(PointXyzRgb::new(i as f64 * 0.01, 0.0, 0.0));
/// }
/// for i in 0..10 {
///     cloud.push(PointXyzRgb::new(5.0 + i as f64 * 0.01, 0.0, 0.0));
/// }
/// let clusters = euclidean_clusters(&cloud, 0.02, 5, 1000).unwrap();
/// assert_eq!(clusters.len(), 2);
/// assert_eq!(clusters[0].len(), 30);
/// assert_eq!(clusters[1].len(), 10);
/// ```
pub fn euclidean_clusters(
    cloud: &PointCloud,
    tolerance: f64,
    min_size: usize,
    max_size: usize,
) -> Result<Vec<Vec<usize>>> {
    ensure!(
        tolerance > 0.0,
        "cluster tolerance must be positive, got {}",
        tolerance
    );
    ensure!(min_size >= 1, "min cluster size must be at least 1");
    if cloud.is_empty() {
        return Ok(Vec::new());
    }

    let items: Vec<IndexedPoint> = cloud
        .positions()
        .enumerate()
        .map(|(index, p)| IndexedPoint {
            position: [p.x, p.y, p.z],
            index,
        })
        .collect();
    let tree = KdTree::build_by_ordered_float(items);

    let mut visited = vec![false; cloud.len()];
    let mut clusters = Vec::new();
    for seed in 0..cloud.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        // grow the component outward from the seed
        let mut cluster = vec![seed];
        let mut frontier = vec![seed];
        while let Some(current) = frontier.pop() {
            let p = cloud.points()[current].position;
            for neighbor in tree.within_radius(&[p.x, p.y, p.z], tolerance) {
                if !visited[neighbor.index] {
                    visited[neighbor.index] = true;
                    cluster.push(neighbor.index);
                    frontier.push(neighbor.index);
                }
            }
        }

        if cluster.len() >= min_size && cluster.len() <= max_size {
            clusters.push(cluster);
        }
    }

    clusters.sort_by(|a, b| b.len().cmp(&a.len()));
    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanseg_core::cloud::PointXyzRgb;

    /// three well-separated blobs of 60, 30 and 6 points
    fn three_blobs() -> PointCloud {
        let mut cloud = PointCloud::new();
        for i in 0..60 {
            cloud.push(PointXyzRgb::new(i as f64 * 0.005, 0.0, 0.0));
        }
        for i in 0..30 {
            cloud.push(PointXyzRgb::new(i as f64 * 0.005, 2.0, 0.0));
        }
        for i in 0..6 {
            cloud.push(PointXyzRgb::new(i as f64 * 0.005, 4.0, 0.0));
        }
        cloud
    }

    #[test]
    fn rejects_invalid_parameters() {
        let cloud = three_blobs();
        assert!(euclidean_clusters(&cloud, 0.0, 1, 100).is_err());
        assert!(euclidean_clusters(&cloud, 0.01, 0, 100).is_err());
    }

    #[test]
    fn finds_components_sorted_by_descending_size() {
        let cloud = three_blobs();
        let clusters = euclidean_clusters(&cloud, 0.01, 1, 1000).unwrap();
        let sizes: Vec<usize> = clusters.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![60, 30, 6]);
    }

    #[test]
    fn size_bounds_filter_components() {
        let cloud = three_blobs();
        let clusters = euclidean_clusters(&cloud, 0.01, 10, 40).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 30);
        for cluster in &clusters {
            assert!(cluster.len() >= 10 && cluster.len() <= 40);
        }
    }

    #[test]
    fn inverted_size_bounds_yield_no_clusters() {
        let cloud = three_blobs();
        let clusters = euclidean_clusters(&cloud, 0.01, 100, 50).unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn indices_point_into_the_source_cloud() {
        let cloud = three_blobs();
        let clusters = euclidean_clusters(&cloud, 0.01, 1, 1000).unwrap();
        let largest = cloud.subset(&clusters[0]);
        assert!(largest.positions().all(|p| p.y == 0.0));
    }

    #[test]
    fn empty_cloud_has_no_clusters() {
        let clusters = euclidean_clusters(&PointCloud::new(), 0.01, 1, 100).unwrap();
        assert!(clusters.is_empty());
    }
}
