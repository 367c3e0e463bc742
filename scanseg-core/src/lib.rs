#![warn(clippy::all)]

//! Core data structures for the scanseg object-scanning pipeline
//!
//! This crate provides the colored point cloud container shared by all pipeline
//! stages, together with the geometric primitives they operate with: rigid 4x4
//! homogeneous transforms and axis-aligned bounding boxes.

pub extern crate nalgebra;

/// Colored point clouds
pub mod cloud;
/// Geometric primitives for working with point cloud data
pub mod math;
