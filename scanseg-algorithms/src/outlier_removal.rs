use anyhow::{ensure, Result};
use kd_tree::KdTree;
use rayon::prelude::*;
use scanseg_core::cloud::PointCloud;

/// Statistical outlier removal.
///
/// For every point the mean distance to its `mean_k` nearest neighbors (the
/// point itself excluded) is computed. Points whose mean neighbor distance
/// exceeds `mu + std_dev_mult * sigma` are discarded, where `mu` and `sigma`
/// are mean and standard deviation of the per-point mean distances over the
/// whole cloud. The relative order of the surviving points is preserved, and
/// the output is always a subset of the input.
///
/// Clouds with fewer than `mean_k` other points are scored against the
/// neighbors that exist.
///
/// Errors if `mean_k` is zero or `std_dev_mult` is not strictly positive.
pub fn statistical_outlier_removal(
    cloud: &PointCloud,
    mean_k: usize,
    std_dev_mult: f64,
) -> Result<PointCloud> {
    ensure!(mean_k >= 1, "mean_k must be at least 1, got {}", mean_k);
    ensure!(
        std_dev_mult > 0.0,
        "std_dev_mult must be positive, got {}",
        std_dev_mult
    );
    if cloud.len() < 2 {
        return Ok(cloud.clone());
    }

    let positions: Vec<[f64; 3]> = cloud.positions().map(|p| [p.x, p.y, p.z]).collect();
    let tree = KdTree::build_by_ordered_float(positions.clone());

    // mean distance to the k nearest neighbors, per point; the nearest match
    // of each query is the point itself at distance zero
    let mean_distances: Vec<f64> = positions
        .par_iter()
        .map(|p| {
            let neighbors = tree.nearests(p, mean_k + 1);
            let count = neighbors.len() - 1;
            let sum: f64 = neighbors
                .iter()
                .skip(1)
                .map(|n| n.squared_distance.sqrt())
                .sum();
            sum / count as f64
        })
        .collect();

    let n = mean_distances.len() as f64;
    let sum: f64 = mean_distances.iter().sum();
    let sq_sum: f64 = mean_distances.iter().map(|d| d * d).sum();
    let mean = sum / n;
    let variance = ((sq_sum - sum * sum / n) / (n - 1.0)).max(0.0);
    let threshold = mean + std_dev_mult * variance.sqrt();

    Ok(cloud
        .iter()
        .zip(mean_distances.iter())
        .filter(|(_, &d)| d <= threshold)
        .map(|(p, _)| *p)
        .collect())
}
