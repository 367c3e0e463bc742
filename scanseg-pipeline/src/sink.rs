use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use scanseg_io::base::write_cloud_file;

use crate::orchestrator::FrameOutcome;

/// An output consumer for processed frames. The orchestrator core stays
/// unaware of where its outputs go; persistence, publishing or display are
/// all sinks behind this trait.
pub trait CloudSink {
    fn consume(&mut self, outcome: &FrameOutcome) -> Result<()>;
}

/// Discards every frame
pub struct NullSink;

impl CloudSink for NullSink {
    fn consume(&mut self, _outcome: &FrameOutcome) -> Result<()> {
        Ok(())
    }
}

/// Persists each frame's raw and segmented clouds as
/// `<dir>/<prefix><zero-padded frame index>.pcd`. Frames whose segmentation
/// failed only produce the raw file.
pub struct PcdDirectorySink {
    dir: PathBuf,
    raw_prefix: String,
    segmented_prefix: String,
    index_width: usize,
}

impl PcdDirectorySink {
    pub fn new(
        dir: PathBuf,
        raw_prefix: &str,
        segmented_prefix: &str,
        index_width: usize,
    ) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("could not create output directory {}", dir.display()))?;
        Ok(Self {
            dir,
            raw_prefix: raw_prefix.to_string(),
            segmented_prefix: segmented_prefix.to_string(),
            index_width,
        })
    }

    fn file_name(&self, prefix: &str, frame_index: u64) -> PathBuf {
        self.dir.join(format!(
            "{}{:0width$}.pcd",
            prefix,
            frame_index,
            width = self.index_width
        ))
    }
}

impl CloudSink for PcdDirectorySink {
    fn consume(&mut self, outcome: &FrameOutcome) -> Result<()> {
        write_cloud_file(
            &outcome.raw,
            self.file_name(&self.raw_prefix, outcome.frame_index),
        )?;
        if let Ok(segmented) = &outcome.segmented {
            write_cloud_file(
                &segmented.cloud,
                self.file_name(&self.segmented_prefix, outcome.frame_index),
            )?;
        }
        Ok(())
    }
}
