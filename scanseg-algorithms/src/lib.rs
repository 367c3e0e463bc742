#![warn(clippy::all)]
//! Geometric processing stages for the scanseg pipeline.
//!
//! Each module is one stage over [scanseg_core::cloud::PointCloud]: a pure
//! function that consumes a cloud (by reference or by value) and produces a
//! reduced or annotated result. The orchestration of the stages lives in the
//! `scanseg-pipeline` crate.

// Algorithm to calculate the bounding box of a point cloud.
pub mod bounds;
// Euclidean clustering: connected components under a distance tolerance,
// filtered by cluster size and ordered by descending size.
pub mod clustering;
// Statistical outlier removal based on the distance distribution of each
// point's nearest-neighborhood.
pub mod outlier_removal;
// Pass-through filter: keeps points inside a closed interval on one axis.
pub mod pass_through;
// Contains the ransac plane-segmentation algorithm in serial and parallel,
// plus iterative removal of the dominant planes of a cloud.
pub mod segmentation;
// Voxel-grid downsampling: one centroid point per occupied grid cell.
pub mod voxel_grid;
