use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use scanseg_algorithms::clustering::euclidean_clusters;
use scanseg_algorithms::outlier_removal::statistical_outlier_removal;
use scanseg_algorithms::pass_through::{pass_through, Axis};
use scanseg_algorithms::segmentation::remove_planes;
use scanseg_algorithms::voxel_grid::voxel_grid_filter;
use scanseg_core::cloud::PointCloud;
use scanseg_core::math::RigidTransform;

use crate::config::PipelineConfig;

/// A point cloud tagged with the frame label its positions are expressed in
#[derive(Debug, Clone)]
pub struct FramedCloud {
    pub frame_id: String,
    pub cloud: PointCloud,
}

/// Everything produced for one processed frame. The rotated cloud is always
/// delivered; the segmented cloud is replaced by the error of the stage that
/// failed when the frame could not be segmented.
#[derive(Debug)]
pub struct FrameOutcome {
    pub frame_index: u64,
    /// The raw cloud as received, in the sensor frame
    pub raw: PointCloud,
    /// The downsampled and denoised full scene, in the robot base frame
    pub rotated: FramedCloud,
    /// The selected object cluster, in the fixture frame
    pub segmented: Result<FramedCloud>,
}

/// The cloud/pose pair consumed by one pipeline run
struct FrameState {
    pose: RigidTransform,
    cloud: PointCloud,
}

/// Owns the per-frame state and sequences the two fixed pipelines.
///
/// Pose and cloud arrivals are paired by a one-shot handshake: a cloud is
/// accepted only if a pose arrived since the previous accepted cloud,
/// otherwise it is dropped. [observe_pose](Orchestrator::observe_pose) only
/// updates cached state and never blocks; [poll](Orchestrator::poll) runs the
/// whole pipeline synchronously to completion. In a multi-threaded host the
/// two must be externally synchronized (the type is `Send`, a single mutex
/// suffices).
pub struct Orchestrator {
    config: PipelineConfig,
    fixture_pose: RigidTransform,
    sensor_pose: Option<RigidTransform>,
    pose_fresh: bool,
    pending: Option<FrameState>,
    frame_index: u64,
}

impl Orchestrator {
    /// Creates an orchestrator over a validated configuration and the
    /// calibrated fixture pose (fixture expressed in the robot base frame).
    /// Errors if the configuration violates a numeric-domain rule.
    pub fn new(config: PipelineConfig, fixture_pose: RigidTransform) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fixture_pose,
            sensor_pose: None,
            pose_fresh: false,
            pending: None,
            frame_index: 0,
        })
    }

    /// Caches a new sensor pose (sensor expressed in the robot base frame)
    /// and marks it fresh. Called from the transport layer; never blocks.
    pub fn observe_pose(&mut self, pose: RigidTransform) {
        self.sensor_pose = Some(pose);
        self.pose_fresh = true;
    }

    /// Caches a sensor pose given as 16 row-major values, the wire format of
    /// the pose input
    pub fn observe_pose_values(&mut self, values: &[f64]) -> Result<()> {
        let pose = RigidTransform::from_row_major(values)?;
        self.observe_pose(pose);
        Ok(())
    }

    /// Offers a raw cloud to the orchestrator. Returns true if the cloud was
    /// accepted for processing; a cloud arriving without a fresh pose since
    /// the previous accepted cloud is dropped.
    pub fn observe_cloud(&mut self, cloud: PointCloud) -> bool {
        if !self.pose_fresh {
            debug!(
                "dropping cloud of {} points: no sensor pose since the last frame",
                cloud.len()
            );
            return false;
        }
        let pose = match self.sensor_pose {
            Some(pose) => pose,
            None => return false,
        };
        self.pose_fresh = false;
        if self.pending.is_some() {
            debug!("replacing an unprocessed pending cloud");
        }
        self.pending = Some(FrameState { pose, cloud });
        true
    }

    /// Runs the pipeline on the pending cloud, if any. Returns `None` when
    /// there is nothing to process.
    pub fn poll(&mut self) -> Option<FrameOutcome> {
        let frame = self.pending.take()?;
        self.frame_index += 1;
        let outcome = self.process(frame);
        self.log_outcome(&outcome);
        Some(outcome)
    }

    fn process(&self, frame: FrameState) -> FrameOutcome {
        let FrameState { pose, cloud: raw } = frame;
        debug!("sensor pose: {:?}", pose.matrix());

        let rotated = self.rotate_stage(&raw, &pose);
        let segmented = match &rotated {
            Ok(cloud) => self.segment_stage(cloud).map(|cloud| FramedCloud {
                frame_id: self.config.frames.fixture.clone(),
                cloud,
            }),
            Err(e) => Err(anyhow!("rotate stage failed: {}", e)),
        };
        // parameter domains were validated up front, so the rotate stage has
        // no remaining failure mode
        let rotated = FramedCloud {
            frame_id: self.config.frames.base.clone(),
            cloud: rotated.unwrap_or_default(),
        };

        FrameOutcome {
            frame_index: self.frame_index,
            raw,
            rotated,
            segmented,
        }
    }

    /// Downsample, denoise, express in the robot base frame
    fn rotate_stage(&self, raw: &PointCloud, pose: &RigidTransform) -> Result<PointCloud> {
        let d = &self.config.downsample;
        let mut cloud = voxel_grid_filter(raw, d.grid_size_x, d.grid_size_y, d.grid_size_z)?;
        debug!("downsampled {} -> {} points", raw.len(), cloud.len());

        let o = &self.config.outlier;
        cloud = statistical_outlier_removal(&cloud, o.mean_k, o.std_dev_mult)?;
        debug!("{} points after outlier removal", cloud.len());

        cloud.transform(pose);
        Ok(cloud)
    }

    /// Range-filter around the fixture anchor, strip planes, select the
    /// largest cluster, express in the fixture frame
    fn segment_stage(&self, rotated: &PointCloud) -> Result<PointCloud> {
        let mut cloud = rotated.clone();

        if self.config.range.enabled {
            let r = &self.config.range;
            let anchor = self.fixture_pose.translation();
            cloud = pass_through(&cloud, Axis::X, anchor.x + r.radius_x, anchor.x - r.radius_x);
            cloud = pass_through(&cloud, Axis::Y, anchor.y + r.radius_y, anchor.y - r.radius_y);
            cloud = pass_through(&cloud, Axis::Z, anchor.z + r.z_up, anchor.z + r.z_low);
            debug!("{} points inside the range box", cloud.len());
        }

        let p = &self.config.plane;
        let (mut cloud, planes_removed) = remove_planes(
            cloud,
            p.distance_threshold,
            p.max_iterations,
            p.num_planes,
            p.min_remaining_ratio,
        )?;
        debug!(
            "removed {} plane(s), {} points remain",
            planes_removed,
            cloud.len()
        );

        if self.config.cluster.enabled {
            let c = &self.config.cluster;
            let clusters = euclidean_clusters(&cloud, c.tolerance, c.min_size, c.max_size)?;
            let largest = clusters.first().ok_or_else(|| {
                anyhow!(
                    "no cluster within size bounds [{}, {}]",
                    c.min_size,
                    c.max_size
                )
            })?;
            debug!(
                "{} cluster(s), selected the largest with {} points",
                clusters.len(),
                largest.len()
            );
            cloud = cloud.subset(largest);
        }

        // change of basis into the fixture frame
        cloud.transform(&self.fixture_pose.inverse());
        Ok(cloud)
    }

    fn log_outcome(&self, outcome: &FrameOutcome) {
        match &outcome.segmented {
            Ok(segmented) => info!(
                "frame {}: raw {} -> rotated {} -> segmented {} points",
                outcome.frame_index,
                outcome.raw.len(),
                outcome.rotated.cloud.len(),
                segmented.cloud.len()
            ),
            Err(e) => warn!(
                "frame {}: raw {} -> rotated {} points, segmentation failed: {}",
                outcome.frame_index,
                outcome.raw.len(),
                outcome.rotated.cloud.len(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanseg_core::cloud::PointXyzRgb;

    /// a configuration that keeps the unit tests light: no range filter, no
    /// plane removal, no clustering
    fn passthrough_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.outlier.mean_k = 3;
        config.range.enabled = false;
        config.plane.num_planes = 0;
        config.cluster.enabled = false;
        config
    }

    fn small_cloud() -> PointCloud {
        (0..20)
            .map(|i| PointXyzRgb::new(i as f64 * 0.001, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn cloud_without_pose_is_dropped() {
        let mut orch = Orchestrator::new(passthrough_config(), RigidTransform::identity()).unwrap();
        assert!(!orch.observe_cloud(small_cloud()));
        assert!(orch.poll().is_none());
    }

    #[test]
    fn pose_is_consumed_exactly_once() {
        let mut orch = Orchestrator::new(passthrough_config(), RigidTransform::identity()).unwrap();
        orch.observe_pose(RigidTransform::identity());
        assert!(orch.observe_cloud(small_cloud()));
        assert!(orch.poll().is_some());
        // no new pose since the accepted cloud: the next one is dropped
        assert!(!orch.observe_cloud(small_cloud()));
        orch.observe_pose(RigidTransform::identity());
        assert!(orch.observe_cloud(small_cloud()));
    }

    #[test]
    fn frame_index_counts_processed_frames() {
        let mut orch = Orchestrator::new(passthrough_config(), RigidTransform::identity()).unwrap();
        for expected in 1..=3 {
            orch.observe_pose(RigidTransform::identity());
            orch.observe_cloud(small_cloud());
            let outcome = orch.poll().unwrap();
            assert_eq!(outcome.frame_index, expected);
        }
    }

    #[test]
    fn malformed_pose_values_are_rejected() {
        let mut orch = Orchestrator::new(passthrough_config(), RigidTransform::identity()).unwrap();
        assert!(orch.observe_pose_values(&[1.0; 12]).is_err());
        assert!(!orch.observe_cloud(small_cloud()));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = passthrough_config();
        config.downsample.grid_size_x = 0.0;
        assert!(Orchestrator::new(config, RigidTransform::identity()).is_err());
    }

    #[test]
    fn outputs_carry_the_configured_frame_labels() {
        let mut config = passthrough_config();
        config.frames.base = "robot_base".to_string();
        config.frames.fixture = "table".to_string();
        let mut orch = Orchestrator::new(config, RigidTransform::identity()).unwrap();
        orch.observe_pose(RigidTransform::identity());
        orch.observe_cloud(small_cloud());
        let outcome = orch.poll().unwrap();
        assert_eq!(outcome.rotated.frame_id, "robot_base");
        assert_eq!(outcome.segmented.unwrap().frame_id, "table");
    }
}
