#![warn(clippy::all)]

//! File I/O for the scanseg pipeline.
//!
//! Two on-disk formats are supported: point clouds as ASCII PCD files
//! ([pcd]), and rigid transforms as whitespace-separated 16-number text files
//! ([pose]), the format the fixture calibration is stored in.

/// Base traits for cloud readers/writers plus extension-dispatched helpers
pub mod base;
/// Reading and writing ASCII PCD files
pub mod pcd;
/// Reading rigid-transform text files
pub mod pose;
