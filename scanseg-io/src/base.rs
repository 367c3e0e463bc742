use std::path::Path;

use anyhow::{bail, Context, Result};
use scanseg_core::cloud::PointCloud;

use crate::pcd::{PcdReader, PcdWriter};

/// Base trait for all types that support reading a point cloud
pub trait CloudReader {
    /// Read one complete point cloud from this reader
    fn read_cloud(&mut self) -> Result<PointCloud>;
}

/// Base trait for all types that support writing a point cloud
pub trait CloudWriter {
    /// Write the given cloud through this writer
    fn write_cloud(&mut self, cloud: &PointCloud) -> Result<()>;
}

fn check_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pcd") => Ok(()),
        _ => bail!(
            "unsupported point cloud format for file {}",
            path.display()
        ),
    }
}

/// Reads the full point cloud in the given file, picking the reader from the
/// file extension (only `.pcd` is currently known)
pub fn read_cloud_file<P: AsRef<Path>>(path: P) -> Result<PointCloud> {
    let path = path.as_ref();
    check_extension(path)?;
    let mut reader = PcdReader::from_path(path)
        .with_context(|| format!("could not open point cloud file {}", path.display()))?;
    reader
        .read_cloud()
        .with_context(|| format!("could not read point cloud file {}", path.display()))
}

/// Writes the given cloud to the given file, picking the writer from the file
/// extension (only `.pcd` is currently known)
pub fn write_cloud_file<P: AsRef<Path>>(cloud: &PointCloud, path: P) -> Result<()> {
    let path = path.as_ref();
    check_extension(path)?;
    let mut writer = PcdWriter::from_path(path)
        .with_context(|| format!("could not create point cloud file {}", path.display()))?;
    writer
        .write_cloud(cloud)
        .with_context(|| format!("could not write point cloud file {}", path.display()))
}
