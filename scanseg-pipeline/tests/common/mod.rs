use scanseg_core::cloud::{PointCloud, PointXyzRgb};
use scanseg_pipeline::PipelineConfig;

/// A 1000-point planar floor at z = 0 with +-5mm of deterministic jitter,
/// spanning roughly a meter in x and y
pub fn planar_floor() -> PointCloud {
    let mut cloud = PointCloud::new();
    let mut i = 0;
    'grid: for gx in 0..32 {
        for gy in 0..32 {
            if i >= 1000 {
                break 'grid;
            }
            let jitter = ((i % 11) as f64 - 5.0) * 0.001;
            cloud.push(PointXyzRgb::with_color(
                gx as f64 * 0.03,
                gy as f64 * 0.03,
                jitter,
                180,
                160,
                140,
            ));
            i += 1;
        }
    }
    cloud
}

/// A compact 200-point object resting above the floor: a 10x5x4 grid inside a
/// 0.3m box, z between 0.1 and 0.145
pub fn object_cluster() -> PointCloud {
    let mut cloud = PointCloud::new();
    for gx in 0..10 {
        for gy in 0..5 {
            for gz in 0..4 {
                cloud.push(PointXyzRgb::with_color(
                    0.40 + gx as f64 * 0.01,
                    0.40 + gy as f64 * 0.01,
                    0.10 + gz as f64 * 0.015,
                    40,
                    90,
                    200,
                ));
            }
        }
    }
    cloud
}

/// Floor plus object, the scene the segmentation scenarios run on
pub fn floor_and_object() -> PointCloud {
    let mut cloud = planar_floor();
    for p in &object_cluster() {
        cloud.push(*p);
    }
    cloud
}

/// The scenario configuration: range filter off, one plane removed, default
/// clustering bounds
pub fn scene_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.range.enabled = false;
    config
}

/// A configuration that reduces the pipeline to downsample + denoise: no
/// range filter, no plane removal, no clustering
pub fn passthrough_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.outlier.mean_k = 3;
    config.outlier.std_dev_mult = 3.0;
    config.range.enabled = false;
    config.plane.num_planes = 0;
    config.cluster.enabled = false;
    config
}
