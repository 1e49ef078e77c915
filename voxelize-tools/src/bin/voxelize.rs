#![warn(clippy::all)]

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::{value_t, App, Arg};
use log::{info, warn};
use rand::{distributions::Uniform, rngs::SmallRng, Rng, SeedableRng};
use voxelize_algorithms::{config::VoxelizerConfig, pipeline::Voxelizer};
use voxelize_core::{
    math::{VoxelGridSpec, AABB},
    nalgebra::{Point3, Vector3},
};

enum PointSource {
    File(PathBuf),
    Random(usize),
}

struct Args {
    pub source: PointSource,
    pub voxel_size: Vector3<f64>,
    pub num_features: usize,
    pub batch_size: Option<usize>,
    pub config_file: Option<PathBuf>,
}

/// Points read from a file or generated randomly, with `num_features` features per point
struct PointCloud {
    positions: Vec<Point3<f64>>,
    features: Vec<f32>,
    num_features: usize,
}

fn parse_voxel_size(value: &str) -> Result<Vector3<f64>> {
    let components = value
        .split(',')
        .map(|component| {
            component
                .trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid voxel size component {}", component))
        })
        .collect::<Result<Vec<_>>>()?;
    match components.as_slice() {
        [size] => Ok(Vector3::new(*size, *size, *size)),
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => bail!(
            "Voxel size must be either one value or three comma-separated values (got {})",
            value
        ),
    }
}

fn get_args() -> Result<Args> {
    let matches = App::new("voxelize")
        .version("0.1")
        .about("Voxelizes a point cloud and prints statistics about the resulting voxels")
        .arg(
            Arg::with_name("INPUT")
                .short("i")
                .long("input")
                .takes_value(true)
                .value_name("INPUT")
                .help("Input text file with one point per line as whitespace-separated 'x y z f1 ... fF' values")
                .required_unless("RANDOM")
                .conflicts_with("RANDOM"),
        )
        .arg(
            Arg::with_name("RANDOM")
                .short("r")
                .long("random")
                .takes_value(true)
                .value_name("COUNT")
                .help("Voxelize COUNT random points instead of reading an input file"),
        )
        .arg(
            Arg::with_name("VOXEL_SIZE")
                .short("v")
                .long("voxel-size")
                .takes_value(true)
                .value_name("SIZE")
                .help("Edge length of a voxel, either a single value or 'x,y,z'")
                .required(true),
        )
        .arg(
            Arg::with_name("FEATURES")
                .short("f")
                .long("features")
                .takes_value(true)
                .value_name("F")
                .help("Number of features per point following the position (default: 1)"),
        )
        .arg(
            Arg::with_name("BATCH_SIZE")
                .short("b")
                .long("batch-size")
                .takes_value(true)
                .value_name("N")
                .help("Voxelize the points in batches of at most N points (default: all points at once)"),
        )
        .arg(
            Arg::with_name("CONFIG")
                .long("config")
                .takes_value(true)
                .value_name("FILE")
                .help("JSON file with a voxelizer configuration. Its grid shape and feature count must match the input"),
        )
        .get_matches();

    let source = match matches.value_of("INPUT") {
        Some(input) => PointSource::File(PathBuf::from(input)),
        None => PointSource::Random(value_t!(matches, "RANDOM", usize)?),
    };
    let voxel_size = parse_voxel_size(
        matches
            .value_of("VOXEL_SIZE")
            .ok_or_else(|| anyhow!("Missing voxel size"))?,
    )?;
    let num_features = if matches.is_present("FEATURES") {
        value_t!(matches, "FEATURES", usize)?
    } else {
        1
    };
    let batch_size = if matches.is_present("BATCH_SIZE") {
        let batch_size = value_t!(matches, "BATCH_SIZE", usize)?;
        if batch_size == 0 {
            bail!("Batch size must be at least 1");
        }
        Some(batch_size)
    } else {
        None
    };
    let config_file = matches.value_of("CONFIG").map(PathBuf::from);

    Ok(Args {
        source,
        voxel_size,
        num_features,
        batch_size,
        config_file,
    })
}

fn read_points<P: AsRef<Path>>(path: P, num_features: usize) -> Result<PointCloud> {
    let path = path.as_ref();
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("Could not open {}", path.display()))?,
    );
    let mut positions = vec![];
    let mut features = vec![];
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values = line.split_whitespace().collect::<Vec<_>>();
        if values.len() != 3 + num_features {
            bail!(
                "{}:{}: Expected {} values per point but got {}",
                path.display(),
                line_number + 1,
                3 + num_features,
                values.len()
            );
        }
        let parse_error = || format!("{}:{}: Invalid number", path.display(), line_number + 1);
        let mut position = Point3::origin();
        for (coordinate, value) in position.coords.iter_mut().zip(&values[..3]) {
            *coordinate = value.parse::<f64>().with_context(parse_error)?;
        }
        positions.push(position);
        for value in &values[3..] {
            features.push(value.parse::<f32>().with_context(parse_error)?);
        }
    }
    Ok(PointCloud {
        positions,
        features,
        num_features,
    })
}

fn random_points(count: usize, num_features: usize) -> PointCloud {
    let mut rng = SmallRng::from_entropy();
    let position_distribution = Uniform::new(-100.0, 100.0);
    let feature_distribution = Uniform::new(0.0f32, 1.0);
    let positions = (0..count)
        .map(|_| {
            Point3::new(
                rng.sample(position_distribution),
                rng.sample(position_distribution),
                rng.sample(position_distribution),
            )
        })
        .collect();
    let features = (0..count * num_features)
        .map(|_| rng.sample(feature_distribution))
        .collect();
    PointCloud {
        positions,
        features,
        num_features,
    }
}

fn load_config<P: AsRef<Path>>(path: P) -> Result<VoxelizerConfig> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid voxelizer configuration in {}", path.display()))
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = get_args()?;

    let t_start = Instant::now();
    let cloud = match &args.source {
        PointSource::File(path) => read_points(path, args.num_features)?,
        PointSource::Random(count) => random_points(*count, args.num_features),
    };
    info!(
        "Loaded {} points in {:.2}s",
        cloud.positions.len(),
        t_start.elapsed().as_secs_f64()
    );
    if cloud.positions.is_empty() {
        warn!("No points to voxelize");
        return Ok(());
    }

    let bounds = cloud.positions.iter().copied().collect::<AABB>();
    let grid_spec = VoxelGridSpec::covering(bounds, args.voxel_size)?;
    info!(
        "Bounds {} - {}, grid {}",
        bounds.min(),
        bounds.max(),
        grid_spec.grid_shape()
    );

    let batch_size = args.batch_size.unwrap_or(cloud.positions.len());
    let config = match &args.config_file {
        Some(path) => {
            let config = load_config(path)?;
            if &config.grid_shape != grid_spec.grid_shape() {
                bail!(
                    "Configured grid {} does not match grid {} of the input",
                    config.grid_shape,
                    grid_spec.grid_shape()
                );
            }
            if config.num_features != cloud.num_features {
                bail!(
                    "Configured feature count {} does not match feature count {} of the input",
                    config.num_features,
                    cloud.num_features
                );
            }
            config
        }
        None => VoxelizerConfig::new(
            grid_spec.grid_shape().clone(),
            cloud.num_features,
            batch_size,
        ),
    };
    let batch_size = usize::min(batch_size, config.max_points);
    if batch_size == 0 {
        bail!("Voxelizer configuration must allow at least one point per batch");
    }

    // The grid covers the bounds, only positions on a maximum boundary that ends exactly on a voxel border need clamping
    let coords = cloud
        .positions
        .iter()
        .flat_map(|position| grid_spec.voxel_coordinate_clamped(position))
        .collect::<Vec<_>>();

    let mut voxelizer = Voxelizer::new(config)?;
    let t_voxelize = Instant::now();
    let mut num_voxels = 0;
    let num_points = cloud.positions.len();
    for batch_start in (0..num_points).step_by(batch_size) {
        let batch_end = usize::min(batch_start + batch_size, num_points);
        let voxels = voxelizer.voxelize(
            &cloud.features[batch_start * cloud.num_features..batch_end * cloud.num_features],
            &coords[batch_start * 3..batch_end * 3],
        )?;
        num_voxels += voxels.len();
    }
    if batch_size < num_points {
        info!(
            "Voxelized {} batches, voxels shared between batches are counted once per batch",
            (num_points + batch_size - 1) / batch_size
        );
    }
    info!(
        "Voxelization took {:.2}ms",
        t_voxelize.elapsed().as_secs_f64() * 1000.0
    );

    println!("Points:                 {}", num_points);
    println!("Voxels:                 {}", num_voxels);
    println!(
        "Mean points per voxel:  {:.2}",
        num_points as f64 / num_voxels as f64
    );
    Ok(())
}
