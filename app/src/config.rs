use std::path::{Path, PathBuf};

use clap::{ArgGroup, Args, ValueEnum};
use coordinate_transformer::{Crs, EPSG_WGS84_GEOGRAPHIC};
use height_estimator::HeightStatistic;
use tank_core::annotation::{ANNOTATION_FILE_NAME, DEFAULT_HEIGHT_PROPERTY, DEFAULT_ID_PROPERTY};
use tank_exporter::plot::PlotConfig;
use tank_parser::source::{DataKind, SourceSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatisticArg {
    Unfiltered,
    Q25,
    Median,
    Mean,
    Q75,
    Q90,
}

impl From<StatisticArg> for HeightStatistic {
    fn from(value: StatisticArg) -> Self {
        match value {
            StatisticArg::Unfiltered => HeightStatistic::Unfiltered,
            StatisticArg::Q25 => HeightStatistic::Q25,
            StatisticArg::Median => HeightStatistic::Median,
            StatisticArg::Mean => HeightStatistic::Mean,
            StatisticArg::Q75 => HeightStatistic::Q75,
            StatisticArg::Q90 => HeightStatistic::Q90,
        }
    }
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("lidar").required(true).args(["lidar_list", "lidar_dir"])))]
#[command(group(ArgGroup::new("dem").required(true).args(["dem_list", "dem_dir"])))]
#[command(group(ArgGroup::new("imagery").args(["imagery_list", "imagery_dir"])))]
pub struct EstimateArgs {
    /// Annotation GeoJSON, or the directory holding tile_level_annotations.geojson
    #[arg(long, value_name = "PATH")]
    pub annotations: PathBuf,

    /// Tank IDs to process: a JSON array or one ID per line
    #[arg(long, value_name = "FILE")]
    pub tank_ids: PathBuf,

    #[arg(long, value_name = "FILE")]
    pub lidar_list: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    pub lidar_dir: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub dem_list: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    pub dem_dir: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub imagery_list: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    pub imagery_dir: Option<PathBuf>,

    /// Write one composite JPEG per tank under this directory
    #[arg(long, value_name = "DIR")]
    pub plot_dir: Option<PathBuf>,

    /// Height statistic merged into the annotations
    #[arg(long, value_enum)]
    pub statistic: StatisticArg,

    #[arg(long, default_value = DEFAULT_HEIGHT_PROPERTY)]
    pub height_column: String,

    #[arg(long, default_value = DEFAULT_ID_PROPERTY)]
    pub id_property: String,

    /// CRS of the lidar X/Y columns
    #[arg(long, default_value = EPSG_WGS84_GEOGRAPHIC)]
    pub lidar_crs: String,

    /// Per-tank CSV report of every statistic
    #[arg(long, value_name = "CSV")]
    pub report: Option<PathBuf>,

    /// Worker threads [default: number of CPUs]
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },
    #[error("{what} is not a directory: {}", path.display())]
    NotADirectory { what: &'static str, path: PathBuf },
    #[error("exactly one {kind} source (list file or directory) is required")]
    Source { kind: DataKind },
    #[error("--{0} must not be empty")]
    Empty(&'static str),
    #[error("--jobs must be at least 1")]
    Jobs,
}

/// Validated settings of one `estimate` run.
#[derive(Debug, Clone)]
pub struct EstimateConfig {
    /// The annotation file itself, never its directory.
    pub annotations: PathBuf,
    pub tank_ids: PathBuf,
    pub lidar: SourceSpec,
    pub dem: SourceSpec,
    pub imagery: Option<SourceSpec>,
    pub plot_dir: Option<PathBuf>,
    pub statistic: HeightStatistic,
    pub height_column: String,
    pub id_property: String,
    pub lidar_crs: Crs,
    pub report: Option<PathBuf>,
    pub jobs: usize,
    pub plot: PlotConfig,
}

impl TryFrom<EstimateArgs> for EstimateConfig {
    type Error = ConfigError;

    fn try_from(args: EstimateArgs) -> Result<Self, Self::Error> {
        let annotations = if args.annotations.is_dir() {
            args.annotations.join(ANNOTATION_FILE_NAME)
        } else {
            args.annotations
        };
        require_file("annotation dataset", &annotations)?;
        require_file("tank id list", &args.tank_ids)?;

        let lidar = source(DataKind::Lidar, args.lidar_list, args.lidar_dir)?;
        let dem = source(DataKind::Dem, args.dem_list, args.dem_dir)?;
        let imagery = match (args.imagery_list, args.imagery_dir) {
            (None, None) => None,
            (list, dir) => Some(source(DataKind::Imagery, list, dir)?),
        };
        if args.plot_dir.is_some() && imagery.is_none() {
            log::warn!("no imagery source given; plots will have an empty imagery panel");
        }

        if args.height_column.trim().is_empty() {
            return Err(ConfigError::Empty("height-column"));
        }
        if args.id_property.trim().is_empty() {
            return Err(ConfigError::Empty("id-property"));
        }
        if args.lidar_crs.trim().is_empty() {
            return Err(ConfigError::Empty("lidar-crs"));
        }
        let jobs = match args.jobs {
            Some(0) => return Err(ConfigError::Jobs),
            Some(n) => n,
            None => num_cpus::get(),
        };

        Ok(Self {
            annotations,
            tank_ids: args.tank_ids,
            lidar,
            dem,
            imagery,
            plot_dir: args.plot_dir,
            statistic: args.statistic.into(),
            height_column: args.height_column,
            id_property: args.id_property,
            lidar_crs: Crs::new(args.lidar_crs),
            report: args.report,
            jobs,
            plot: PlotConfig::default(),
        })
    }
}

fn require_file(what: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::NotFound {
            what,
            path: path.to_path_buf(),
        })
    }
}

fn source(
    kind: DataKind,
    list: Option<PathBuf>,
    dir: Option<PathBuf>,
) -> Result<SourceSpec, ConfigError> {
    let spec = SourceSpec::from_options(list, dir).ok_or(ConfigError::Source { kind })?;
    match &spec {
        SourceSpec::List(path) => require_file("list file", path)?,
        SourceSpec::Directory(path) if !path.is_dir() => {
            return Err(ConfigError::NotADirectory {
                what: "input directory",
                path: path.clone(),
            })
        }
        SourceSpec::Directory(_) => {}
    }
    Ok(spec)
}
