use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use scanseg_core::cloud::{PointCloud, PointXyzRgb};
use scanseg_core::nalgebra::Vector3;

use crate::base::{CloudReader, CloudWriter};

/// The fields written per point. Color uses the packed-rgb convention: the
/// three 8-bit channels occupy the low 24 bits of one unsigned value.
const FIELDS: &str = "x y z rgb";

fn pack_rgb(color: &Vector3<u8>) -> u32 {
    ((color.x as u32) << 16) | ((color.y as u32) << 8) | color.z as u32
}

fn unpack_rgb(rgb: u32) -> Vector3<u8> {
    Vector3::new(
        ((rgb >> 16) & 0xff) as u8,
        ((rgb >> 8) & 0xff) as u8,
        (rgb & 0xff) as u8,
    )
}

/// `CloudWriter` implementation for ASCII PCD v0.7 files
pub struct PcdWriter<W: Write> {
    write: W,
}

impl PcdWriter<BufWriter<File>> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_write(BufWriter::new(file)))
    }
}

impl<W: Write> PcdWriter<W> {
    pub fn from_write(write: W) -> Self {
        Self { write }
    }
}

impl<W: Write> CloudWriter for PcdWriter<W> {
    fn write_cloud(&mut self, cloud: &PointCloud) -> Result<()> {
        writeln!(self.write, "# .PCD v0.7 - Point Cloud Data file format")?;
        writeln!(self.write, "VERSION 0.7")?;
        writeln!(self.write, "FIELDS {}", FIELDS)?;
        writeln!(self.write, "SIZE 8 8 8 4")?;
        writeln!(self.write, "TYPE F F F U")?;
        writeln!(self.write, "COUNT 1 1 1 1")?;
        writeln!(self.write, "WIDTH {}", cloud.len())?;
        writeln!(self.write, "HEIGHT 1")?;
        writeln!(self.write, "VIEWPOINT 0 0 0 1 0 0 0")?;
        writeln!(self.write, "POINTS {}", cloud.len())?;
        writeln!(self.write, "DATA ascii")?;
        for point in cloud {
            writeln!(
                self.write,
                "{} {} {} {}",
                point.position.x,
                point.position.y,
                point.position.z,
                pack_rgb(&point.color)
            )?;
        }
        self.write.flush()?;
        Ok(())
    }
}

/// `CloudReader` implementation for ASCII PCD files. Only the `x y z` and
/// (optionally) packed `rgb` fields are interpreted; binary PCD data is
/// rejected.
pub struct PcdReader<R: BufRead> {
    read: R,
}

impl PcdReader<BufReader<File>> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_read(BufReader::new(file)))
    }
}

struct PcdHeader {
    fields: Vec<String>,
    points: usize,
}

impl<R: BufRead> PcdReader<R> {
    pub fn from_read(read: R) -> Self {
        Self { read }
    }

    fn read_header(&mut self) -> Result<PcdHeader> {
        let mut fields = None;
        let mut points = None;
        loop {
            let mut line = String::new();
            if self.read.read_line(&mut line)? == 0 {
                bail!("unexpected end of file inside PCD header");
            }
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let key = tokens.next().unwrap_or_default();
            match key {
                "FIELDS" => fields = Some(tokens.map(str::to_string).collect::<Vec<_>>()),
                "POINTS" => {
                    let count = tokens
                        .next()
                        .context("POINTS header entry without a count")?;
                    points = Some(
                        count
                            .parse::<usize>()
                            .with_context(|| format!("invalid POINTS count {:?}", count))?,
                    );
                }
                "DATA" => {
                    let format = tokens.next().unwrap_or_default();
                    ensure!(
                        format == "ascii",
                        "only ascii PCD data is supported, got {:?}",
                        format
                    );
                    break;
                }
                // VERSION, SIZE, TYPE, COUNT, WIDTH, HEIGHT, VIEWPOINT
                _ => {}
            }
        }
        let fields = fields.context("PCD header is missing the FIELDS entry")?;
        let points = points.context("PCD header is missing the POINTS entry")?;
        Ok(PcdHeader { fields, points })
    }
}

impl<R: BufRead> CloudReader for PcdReader<R> {
    fn read_cloud(&mut self) -> Result<PointCloud> {
        let header = self.read_header()?;
        let field_index = |name: &str| header.fields.iter().position(|f| f == name);
        let ix = field_index("x").context("PCD file has no x field")?;
        let iy = field_index("y").context("PCD file has no y field")?;
        let iz = field_index("z").context("PCD file has no z field")?;
        let irgb = field_index("rgb");

        let mut cloud = PointCloud::with_capacity(header.points);
        let mut line = String::new();
        for point_number in 0..header.points {
            line.clear();
            if self.read.read_line(&mut line)? == 0 {
                bail!(
                    "unexpected end of file: expected {} points, got {}",
                    header.points,
                    point_number
                );
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            ensure!(
                tokens.len() == header.fields.len(),
                "point {} has {} values but the header declares {} fields",
                point_number,
                tokens.len(),
                header.fields.len()
            );
            let coord = |i: usize| -> Result<f64> {
                tokens[i].parse().with_context(|| {
                    format!("invalid coordinate {:?} in point {}", tokens[i], point_number)
                })
            };
            let color = match irgb {
                Some(i) => {
                    let packed: u32 = tokens[i].parse().with_context(|| {
                        format!("invalid rgb value {:?} in point {}", tokens[i], point_number)
                    })?;
                    unpack_rgb(packed)
                }
                None => Vector3::new(0, 0, 0),
            };
            cloud.push(PointXyzRgb {
                position: Vector3::new(coord(ix)?, coord(iy)?, coord(iz)?),
                color,
            });
        }
        Ok(cloud)
    }
}
