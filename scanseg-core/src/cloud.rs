use std::iter::FromIterator;

use nalgebra::Vector3;

use crate::math::RigidTransform;

/// A single colored point: a 3D position plus an 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointXyzRgb {
    pub position: Vector3<f64>,
    pub color: Vector3<u8>,
}

impl PointXyzRgb {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            color: Vector3::new(0, 0, 0),
        }
    }

    pub fn with_color(x: f64, y: f64, z: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            color: Vector3::new(r, g, b),
        }
    }
}

/// An ordered sequence of colored points. Point order carries no meaning on its
/// own, but index-based operations ([subset](PointCloud::subset),
/// [without_indices](PointCloud::without_indices)) refer to the current order.
///
/// Each pipeline stage consumes one cloud and produces a new (or in-place
/// mutated) one; a cloud is never shared between two stages.
///
/// ```
/// # use scanseg_core::cloud::{PointCloud, PointXyzRgb};
/// let cloud: PointCloud = (0..4).map(|i| PointXyzRgb::new(i as f64, 0.0, 0.0)).collect();
/// assert_eq!(cloud.len(), 4);
/// let front = cloud.subset(&[0, 1]);
/// assert_eq!(front.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<PointXyzRgb>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn from_points(points: Vec<PointXyzRgb>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, point: PointXyzRgb) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[PointXyzRgb] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointXyzRgb> {
        self.points.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, PointXyzRgb> {
        self.points.iter_mut()
    }

    /// Iterator over the positions of all points, in cloud order
    pub fn positions(&self) -> impl Iterator<Item = &Vector3<f64>> + '_ {
        self.points.iter().map(|p| &p.position)
    }

    /// Returns a new cloud holding copies of the points at the given indices,
    /// in index order.
    ///
    /// # Panics
    ///
    /// If any index is out of bounds.
    pub fn subset(&self, indices: &[usize]) -> PointCloud {
        PointCloud {
            points: indices.iter().map(|&i| self.points[i]).collect(),
        }
    }

    /// Returns a new cloud with the points at the given indices removed. The
    /// relative order of the surviving points is preserved.
    pub fn without_indices(&self, indices: &[usize]) -> PointCloud {
        let mut removed = vec![false; self.points.len()];
        for &i in indices {
            removed[i] = true;
        }
        PointCloud {
            points: self
                .points
                .iter()
                .zip(removed.iter())
                .filter(|(_, &r)| !r)
                .map(|(p, _)| *p)
                .collect(),
        }
    }

    /// Applies the given rigid transform to every point in place. Colors are
    /// untouched.
    pub fn transform(&mut self, transform: &RigidTransform) {
        for p in &mut self.points {
            p.position = transform.transform_point(&p.position);
        }
    }
}

impl FromIterator<PointXyzRgb> for PointCloud {
    fn from_iter<T: IntoIterator<Item = PointXyzRgb>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PointCloud {
    type Item = PointXyzRgb;
    type IntoIter = std::vec::IntoIter<PointXyzRgb>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a PointXyzRgb;
    type IntoIter = std::slice::Iter<'a, PointXyzRgb>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
