use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use scanseg_core::math::RigidTransform;

/// Parses a rigid transform from a whitespace-separated sequence of exactly 16
/// numbers, interpreted row-major. This is the format the calibrated fixture
/// pose is stored in.
///
/// ```
/// # use scanseg_io::pose::parse_transform;
/// let t = parse_transform("1 0 0 0.5  0 1 0 0  0 0 1 0  0 0 0 1").unwrap();
/// assert_eq!(t.translation().x, 0.5);
/// ```
pub fn parse_transform(text: &str) -> Result<RigidTransform> {
    let mut values = Vec::with_capacity(16);
    for token in text.split_whitespace() {
        let value: f64 = token
            .parse()
            .with_context(|| format!("invalid number {:?} in transform", token))?;
        values.push(value);
    }
    ensure!(
        values.len() == 16,
        "a transform file holds exactly 16 numbers, found {}",
        values.len()
    );
    RigidTransform::from_row_major(&values)
}

/// Reads a rigid transform from the text file at `path`. Malformed content is
/// an error; this is a fatal condition at configuration-load time.
pub fn read_transform_file<P: AsRef<Path>>(path: P) -> Result<RigidTransform> {
    let text = fs::read_to_string(path.as_ref())
        .with_context(|| format!("could not read transform file {}", path.as_ref().display()))?;
    parse_transform(&text)
        .with_context(|| format!("malformed transform file {}", path.as_ref().display()))
}
