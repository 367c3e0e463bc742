use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Default value functions for serde deserialization
mod defaults {
    pub fn grid_size() -> f64 {
        0.005
    }
    pub fn mean_k() -> usize {
        50
    }
    pub fn std_dev_mult() -> f64 {
        1.0
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn range_radius() -> f64 {
        0.25
    }
    pub fn z_low() -> f64 {
        -0.1
    }
    pub fn z_up() -> f64 {
        0.5
    }
    pub fn plane_distance_threshold() -> f64 {
        0.01
    }
    pub fn plane_max_iterations() -> usize {
        100
    }
    pub fn num_planes() -> usize {
        1
    }
    pub fn min_remaining_ratio() -> f64 {
        -1.0
    }
    pub fn cluster_tolerance() -> f64 {
        0.02
    }
    pub fn min_cluster_size() -> usize {
        100
    }
    pub fn max_cluster_size() -> usize {
        10000
    }
    pub fn base_frame() -> String {
        "base".to_string()
    }
    pub fn fixture_frame() -> String {
        "fixture".to_string()
    }
}

/// Voxel-grid downsampling settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownsampleSection {
    /// Grid cell edge lengths in meters, per axis
    #[serde(default = "defaults::grid_size")]
    pub grid_size_x: f64,
    #[serde(default = "defaults::grid_size")]
    pub grid_size_y: f64,
    #[serde(default = "defaults::grid_size")]
    pub grid_size_z: f64,
}

impl Default for DownsampleSection {
    fn default() -> Self {
        Self {
            grid_size_x: defaults::grid_size(),
            grid_size_y: defaults::grid_size(),
            grid_size_z: defaults::grid_size(),
        }
    }
}

/// Statistical outlier removal settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutlierSection {
    /// Number of nearest neighbors scored per point
    #[serde(default = "defaults::mean_k")]
    pub mean_k: usize,
    /// Multiplier on the standard deviation of mean neighbor distances
    #[serde(default = "defaults::std_dev_mult")]
    pub std_dev_mult: f64,
}

impl Default for OutlierSection {
    fn default() -> Self {
        Self {
            mean_k: defaults::mean_k(),
            std_dev_mult: defaults::std_dev_mult(),
        }
    }
}

/// Range (pass-through) filter settings. The filter intersects three slabs
/// into a box around the fixture anchor point.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RangeSection {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
    /// Half-width of the box around the anchor, x axis
    #[serde(default = "defaults::range_radius")]
    pub radius_x: f64,
    /// Half-width of the box around the anchor, y axis
    #[serde(default = "defaults::range_radius")]
    pub radius_y: f64,
    /// Lower z offset relative to the anchor
    #[serde(default = "defaults::z_low")]
    pub z_low: f64,
    /// Upper z offset relative to the anchor
    #[serde(default = "defaults::z_up")]
    pub z_up: f64,
}

impl Default for RangeSection {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            radius_x: defaults::range_radius(),
            radius_y: defaults::range_radius(),
            z_low: defaults::z_low(),
            z_up: defaults::z_up(),
        }
    }
}

/// Plane removal settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaneSection {
    /// Inlier distance threshold of the ransac estimator
    #[serde(default = "defaults::plane_distance_threshold")]
    pub distance_threshold: f64,
    /// Ransac iteration budget per plane
    #[serde(default = "defaults::plane_max_iterations")]
    pub max_iterations: usize,
    /// How many planes to strip per frame
    #[serde(default = "defaults::num_planes")]
    pub num_planes: usize,
    /// Early-stop when the surviving fraction of points drops below this
    /// ratio; negative disables the criterion
    #[serde(default = "defaults::min_remaining_ratio")]
    pub min_remaining_ratio: f64,
}

impl Default for PlaneSection {
    fn default() -> Self {
        Self {
            distance_threshold: defaults::plane_distance_threshold(),
            max_iterations: defaults::plane_max_iterations(),
            num_planes: defaults::num_planes(),
            min_remaining_ratio: defaults::min_remaining_ratio(),
        }
    }
}

/// Euclidean clustering settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterSection {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
    /// Neighbor distance tolerance of the region growing
    #[serde(default = "defaults::cluster_tolerance")]
    pub tolerance: f64,
    #[serde(default = "defaults::min_cluster_size")]
    pub min_size: usize,
    #[serde(default = "defaults::max_cluster_size")]
    pub max_size: usize,
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            tolerance: defaults::cluster_tolerance(),
            min_size: defaults::min_cluster_size(),
            max_size: defaults::max_cluster_size(),
        }
    }
}

/// Frame labels attached to the two output clouds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameSection {
    #[serde(default = "defaults::base_frame")]
    pub base: String,
    #[serde(default = "defaults::fixture_frame")]
    pub fixture: String,
}

impl Default for FrameSection {
    fn default() -> Self {
        Self {
            base: defaults::base_frame(),
            fixture: defaults::fixture_frame(),
        }
    }
}

/// Full pipeline configuration, loaded from one YAML file at startup and
/// fixed for the process lifetime. All numeric-domain rules are checked by
/// [validate](PipelineConfig::validate) before the first frame is processed.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub downsample: DownsampleSection,

    #[serde(default)]
    pub outlier: OutlierSection,

    #[serde(default)]
    pub range: RangeSection,

    #[serde(default)]
    pub plane: PlaneSection,

    #[serde(default)]
    pub cluster: ClusterSection,

    #[serde(default)]
    pub frames: FrameSection,

    /// Path to the calibrated fixture pose file (16 row-major numbers)
    #[serde(default)]
    pub fixture_pose_file: Option<PathBuf>,
}

impl PipelineConfig {
    /// Loads and validates the configuration from a YAML file. Any failure
    /// here is fatal at startup.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "could not read pipeline configuration {}",
                path.as_ref().display()
            )
        })?;
        let config = Self::from_yaml(&contents).with_context(|| {
            format!(
                "malformed pipeline configuration {}",
                path.as_ref().display()
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a YAML string without validating
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("could not parse pipeline configuration YAML")
    }

    /// Checks the numeric domain of every parameter. An inverted cluster size
    /// range (`max_size < min_size`) is deliberately not rejected: it is a
    /// legitimate (if useless) configuration that yields the per-frame
    /// "no cluster" outcome.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.downsample.grid_size_x > 0.0
                && self.downsample.grid_size_y > 0.0
                && self.downsample.grid_size_z > 0.0,
            "downsample grid sizes must be positive, got ({}, {}, {})",
            self.downsample.grid_size_x,
            self.downsample.grid_size_y,
            self.downsample.grid_size_z
        );
        ensure!(
            self.outlier.mean_k >= 1,
            "outlier mean_k must be at least 1"
        );
        ensure!(
            self.outlier.std_dev_mult > 0.0,
            "outlier std_dev_mult must be positive, got {}",
            self.outlier.std_dev_mult
        );
        if self.range.enabled {
            ensure!(
                self.range.radius_x > 0.0 && self.range.radius_y > 0.0,
                "range filter radii must be positive, got ({}, {})",
                self.range.radius_x,
                self.range.radius_y
            );
        }
        ensure!(
            self.plane.distance_threshold > 0.0,
            "plane distance_threshold must be positive, got {}",
            self.plane.distance_threshold
        );
        ensure!(
            self.plane.max_iterations >= 1,
            "plane max_iterations must be at least 1"
        );
        ensure!(
            self.plane.min_remaining_ratio <= 1.0,
            "plane min_remaining_ratio cannot exceed 1.0, got {}",
            self.plane.min_remaining_ratio
        );
        if self.cluster.enabled {
            ensure!(
                self.cluster.tolerance > 0.0,
                "cluster tolerance must be positive, got {}",
                self.cluster.tolerance
            );
            ensure!(
                self.cluster.min_size >= 1,
                "cluster min_size must be at least 1"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = PipelineConfig::from_yaml("{}").unwrap();
        assert_eq!(config.downsample.grid_size_x, 0.005);
        assert_eq!(config.outlier.mean_k, 50);
        assert_eq!(config.cluster.max_size, 10000);
        assert_eq!(config.frames.base, "base");
        assert!(config.fixture_pose_file.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let yaml = "
downsample:
  grid_size_x: 0.01
cluster:
  enabled: false
fixture_pose_file: config/fixture.txt
";
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.downsample.grid_size_x, 0.01);
        assert_eq!(config.downsample.grid_size_y, 0.005);
        assert!(!config.cluster.enabled);
        assert_eq!(
            config.fixture_pose_file,
            Some(PathBuf::from("config/fixture.txt"))
        );
    }

    #[test]
    fn zero_grid_size_is_rejected() {
        let mut config = PipelineConfig::default();
        config.downsample.grid_size_y = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_tolerance_is_rejected() {
        let mut config = PipelineConfig::default();
        config.cluster.tolerance = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn disabled_stages_skip_their_domain_checks() {
        let mut config = PipelineConfig::default();
        config.range.enabled = false;
        config.range.radius_x = -1.0;
        config.validate().unwrap();
    }

    #[test]
    fn inverted_cluster_bounds_are_accepted() {
        let mut config = PipelineConfig::default();
        config.cluster.min_size = 100;
        config.cluster.max_size = 50;
        config.validate().unwrap();
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(PipelineConfig::from_yaml("downsample: [not, a, map]").is_err());
    }
}
