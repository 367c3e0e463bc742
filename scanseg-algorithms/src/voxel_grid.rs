use std::collections::HashMap;

use anyhow::{ensure, Result};
use scanseg_core::cloud::{PointCloud, PointXyzRgb};
use scanseg_core::nalgebra::Vector3;

/// One occupied cell of the voxel grid, accumulating the points that fall into
/// it until the centroid is emitted
struct Voxel {
    position_sum: Vector3<f64>,
    color_sum: Vector3<f64>,
    count: usize,
}

impl Voxel {
    fn empty() -> Self {
        Self {
            position_sum: Vector3::zeros(),
            color_sum: Vector3::zeros(),
            count: 0,
        }
    }

    fn accumulate(&mut self, point: &PointXyzRgb) {
        self.position_sum += point.position;
        self.color_sum += Vector3::new(
            point.color.x as f64,
            point.color.y as f64,
            point.color.z as f64,
        );
        self.count += 1;
    }

    fn centroid(&self) -> PointXyzRgb {
        let n = self.count as f64;
        let color = self.color_sum / n;
        PointXyzRgb {
            position: self.position_sum / n,
            color: Vector3::new(
                color.x.round() as u8,
                color.y.round() as u8,
                color.z.round() as u8,
            ),
        }
    }
}

/// finds the cell of point p on a grid aligned to integer multiples of the
/// leaf sizes
fn find_cell(p: &Vector3<f64>, leaf_x: f64, leaf_y: f64, leaf_z: f64) -> (i64, i64, i64) {
    (
        (p.x / leaf_x).floor() as i64,
        (p.y / leaf_y).floor() as i64,
        (p.z / leaf_z).floor() as i64,
    )
}

/// Downsamples the cloud on a regular grid of axis-aligned boxes with the
/// given edge lengths: every output point is the centroid (average position
/// and average color) of all input points falling into the same box. The
/// output order is the box-iteration order and carries no meaning.
///
/// The grid is anchored at the coordinate origin, so every centroid stays
/// inside the box it was computed from and filtering again with the same edge
/// lengths reduces nothing further.
///
/// Errors if any edge length is not strictly positive.
///
/// ```
/// # use scanseg_core::cloud::{PointCloud, PointXyzRgb};
/// # use scanseg_algorithms::voxel_grid::voxel_grid_filter;
/// let cloud: PointCloud = (0..100)
///     .map(|i| PointXyzRgb::new(i as f64 * 0.001, 0.0, 0.0))
///     .collect();
/// let filtered = voxel_grid_filter(&cloud, 0.05, 0.05, 0.05).unwrap();
/// assert_eq!(filtered.len(), 2);
/// ```
pub fn voxel_grid_filter(
    cloud: &PointCloud,
    leaf_x: f64,
    leaf_y: f64,
    leaf_z: f64,
) -> Result<PointCloud> {
    ensure!(
        leaf_x > 0.0 && leaf_y > 0.0 && leaf_z > 0.0,
        "voxel grid edge lengths must be positive, got ({}, {}, {})",
        leaf_x,
        leaf_y,
        leaf_z
    );

    let mut grid: HashMap<(i64, i64, i64), Voxel> = HashMap::new();
    for point in cloud {
        let cell = find_cell(&point.position, leaf_x, leaf_y, leaf_z);
        grid.entry(cell).or_insert_with(Voxel::empty).accumulate(point);
    }

    Ok(grid.values().map(Voxel::centroid).collect())
}
