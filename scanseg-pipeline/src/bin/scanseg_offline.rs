use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{App, Arg};
use log::info;
use scanseg_io::base::read_cloud_file;
use scanseg_io::pose::read_transform_file;
use scanseg_pipeline::{CloudSink, Orchestrator, PcdDirectorySink, PipelineConfig};

struct Args {
    pub config: PathBuf,
    pub sensor_pose: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

fn get_args() -> Result<Args> {
    let matches = App::new("scanseg offline pipeline")
        .version("0.1")
        .about("Runs recorded point cloud frames through the scanseg pipeline")
        .arg(
            Arg::with_name("CONFIG")
                .short("c")
                .long("config")
                .takes_value(true)
                .value_name("CONFIG")
                .help("Pipeline configuration YAML file")
                .required(true),
        )
        .arg(
            Arg::with_name("POSE")
                .short("p")
                .long("sensor-pose")
                .takes_value(true)
                .value_name("POSE")
                .help("Sensor pose file (16 row-major numbers, sensor in the robot base frame)")
                .required(true),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .short("o")
                .long("output-dir")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Directory the raw and segmented PCD files are written to")
                .required(true),
        )
        .arg(
            Arg::with_name("INPUT")
                .takes_value(true)
                .multiple(true)
                .value_name("INPUT")
                .help("Input point cloud files (.pcd), one frame each")
                .required(true),
        )
        .get_matches();

    Ok(Args {
        config: PathBuf::from(matches.value_of("CONFIG").unwrap()),
        sensor_pose: PathBuf::from(matches.value_of("POSE").unwrap()),
        output_dir: PathBuf::from(matches.value_of("OUTPUT").unwrap()),
        inputs: matches
            .values_of("INPUT")
            .unwrap()
            .map(PathBuf::from)
            .collect(),
    })
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = get_args()?;

    // all configuration errors are fatal before the first frame
    let config = PipelineConfig::load(&args.config)?;
    let fixture_file = config
        .fixture_pose_file
        .clone()
        .context("configuration is missing fixture_pose_file")?;
    let fixture_pose = read_transform_file(&fixture_file)?;
    let sensor_pose = read_transform_file(&args.sensor_pose)?;

    let mut orchestrator = Orchestrator::new(config, fixture_pose)?;
    let mut sink = PcdDirectorySink::new(
        args.output_dir.clone(),
        "cloud_src_",
        "cloud_segmented_",
        5,
    )?;

    let mut processed = 0;
    for input in &args.inputs {
        let cloud = read_cloud_file(input)?;
        orchestrator.observe_pose(sensor_pose);
        if !orchestrator.observe_cloud(cloud) {
            continue;
        }
        if let Some(outcome) = orchestrator.poll() {
            sink.consume(&outcome)?;
            processed += 1;
        }
    }

    info!(
        "processed {} of {} input frame(s) into {}",
        processed,
        args.inputs.len(),
        args.output_dir.display()
    );
    Ok(())
}
