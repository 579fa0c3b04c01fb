use std::{cmp::Ordering, path::Path, time::Instant};

use height_estimator::{
    merge::{merge_heights, MergeReport},
    sampling::BareEarthSampler,
    statistic::round2,
    EstimateError, HeightEstimate, HeightEstimator, HeightSummary,
};
use itertools::Itertools;
use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};
use tank_core::tank::TankId;
use tank_exporter::{
    geojson::write_feature_collection,
    list::write_tank_ids,
    plot::TankPlot,
    report::{write_report, ReportRow},
    ExportError,
};
use tank_parser::{
    parsers::{
        geojson::{AnnotationParser, LidarParser},
        geotiff::DemParser,
        imagery::read_tile_crop,
        list::read_tank_ids,
        Parser as _,
    },
    source::{DataKind, SourceSpec, TankPathIndex, TileIndex},
    ParseError, SourceError,
};

use crate::config::{ConfigError, EstimateConfig};

/// Errors that end the run.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read the annotation dataset: {0}")]
    Annotations(#[source] ParseError),
    #[error("failed to read the tank id list: {0}")]
    TankIds(#[source] ParseError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Errors that skip a single tank.
#[derive(Debug, thiserror::Error)]
pub enum TankError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Estimate(#[from] EstimateError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Per-tank input files, indexed once before the workers start.
pub struct Inputs {
    lidar: TankPathIndex,
    dem: TankPathIndex,
    tiles: Option<TileIndex>,
}

impl Inputs {
    pub fn resolve(config: &EstimateConfig) -> Result<Self, SourceError> {
        let lidar = TankPathIndex::build(DataKind::Lidar, config.lidar.resolve(DataKind::Lidar)?);
        let dem = TankPathIndex::build(DataKind::Dem, config.dem.resolve(DataKind::Dem)?);
        let tiles = config
            .imagery
            .as_ref()
            .map(|spec| spec.resolve(DataKind::Imagery).map(TileIndex::build))
            .transpose()?;
        log::info!("indexed {} lidar and {} DEM files", lidar.len(), dem.len());
        Ok(Self { lidar, dem, tiles })
    }
}

pub struct TankOutcome {
    pub object_class: Option<String>,
    pub summary: HeightSummary,
    /// The configured statistic; may be an empty selection.
    pub estimate: Result<HeightEstimate, EstimateError>,
}

/// Samples the DEM under the tank's lidar records, rewrites the lidar file
/// with `bare_earth_elevation`, computes the heights and draws the plot.
pub fn process_tank(
    tank_id: &TankId,
    config: &EstimateConfig,
    inputs: &Inputs,
) -> Result<TankOutcome, TankError> {
    let start = Instant::now();
    let lidar_path = inputs.lidar.get(tank_id)?;
    let dem_path = inputs.dem.get(tank_id)?;

    let mut lidar = LidarParser {
        filename: lidar_path.to_path_buf(),
    }
    .parse()?;
    let dem = DemParser {
        filename: dem_path.to_path_buf(),
    }
    .parse()?;
    log::debug!(
        "tank {tank_id}: {} records, {}x{} DEM",
        lidar.len(),
        dem.width(),
        dem.height()
    );

    BareEarthSampler::new(config.lidar_crs.clone()).augment(&mut lidar, &dem)?;
    write_feature_collection(lidar_path, &lidar.collection)?;

    let summary = HeightSummary::compute(&lidar.points);
    let estimate = HeightEstimator::new(config.statistic).estimate(&lidar.points);

    if let Some(plot_dir) = &config.plot_dir {
        let imagery = inputs.tiles.as_ref().and_then(|tiles| {
            let name = lidar.metadata.tile_name.as_deref()?;
            let bounds = lidar.metadata.pixel_bounds?;
            let crop = tiles
                .get(name)
                .map_err(TankError::from)
                .and_then(|path| read_tile_crop(path, bounds).map_err(TankError::from));
            match crop {
                Ok(image) => Some(image),
                Err(e) => {
                    log::warn!("tank {tank_id}: no imagery for the plot: {e}");
                    None
                }
            }
        });
        let plot = TankPlot::new(tank_id, &lidar, &config.lidar_crs, &dem, imagery.as_ref())
            .and_then(|plot| plot.save(plot_dir, &config.plot));
        if let Err(e) = plot {
            log::warn!("tank {tank_id}: plot not written: {e}");
        }
    }

    log::debug!("tank {tank_id}: done in {:?}", start.elapsed());
    Ok(TankOutcome {
        object_class: lidar.metadata.object_class.clone(),
        summary,
        estimate,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub estimated: usize,
    pub failed: usize,
    pub merge: MergeReport,
}

pub fn run_estimate(config: &EstimateConfig) -> Result<RunSummary, AppError> {
    log::info!("annotations: {}", config.annotations.display());
    log::info!("statistic: {}", config.statistic);
    log::info!("workers: {}", config.jobs);

    let mut annotations = AnnotationParser {
        filename: config.annotations.clone(),
        id_property: config.id_property.clone(),
    }
    .parse()
    .map_err(AppError::Annotations)?;
    log::info!("{} annotation features", annotations.len());

    let tank_ids: Vec<TankId> = read_tank_ids(&config.tank_ids)
        .map_err(AppError::TankIds)?
        .into_iter()
        .unique()
        .collect();
    log::info!("{} tanks to process", tank_ids.len());

    let inputs = Inputs::resolve(config)?;

    log::info!("start estimating...");
    let start_local = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()?;
    let results: Vec<(&TankId, Result<TankOutcome, TankError>)> = pool.install(|| {
        tank_ids
            .par_iter()
            .map(|id| (id, process_tank(id, config, &inputs)))
            .collect()
    });
    log::info!("finish estimating in {:?}", start_local.elapsed());

    let mut estimates = Vec::new();
    let mut rows = Vec::new();
    let mut failed = 0;
    for (tank_id, result) in results {
        match result {
            Ok(outcome) => {
                let mut row =
                    ReportRow::ok(tank_id.clone(), outcome.object_class, outcome.summary);
                match outcome.estimate {
                    Ok(estimate) => {
                        log::info!(
                            "tank {tank_id}: {} height {:.2} m from {} points",
                            estimate.statistic,
                            round2(estimate.value),
                            estimate.points_used
                        );
                        estimates.push((tank_id, estimate));
                    }
                    Err(e) => {
                        log::error!("tank {tank_id}: {e}");
                        row.error = Some(e.to_string());
                        failed += 1;
                    }
                }
                rows.push(row);
            }
            Err(e) => {
                log::error!("tank {tank_id}: {e}");
                rows.push(ReportRow::failed(tank_id.clone(), &e));
                failed += 1;
            }
        }
    }

    let merge = merge_heights(
        &mut annotations,
        &tank_ids,
        estimates.iter().map(|(id, e)| (*id, e)),
        &config.height_column,
    );
    write_feature_collection(&config.annotations, &annotations.collection)?;
    log::info!(
        "merged {} heights into {} features",
        estimates.len(),
        merge.updated
    );
    if merge.cleared > 0 {
        log::info!("cleared {} stale heights", merge.cleared);
    }

    if let Some(report) = &config.report {
        write_report(report, &rows)?;
    }

    if failed > 0 {
        log::warn!("{failed} of {} tanks failed", tank_ids.len());
    }
    Ok(RunSummary {
        estimated: estimates.len(),
        failed,
        merge,
    })
}

/// Tank IDs that have both a lidar file and a DEM file, written to `output`.
pub fn run_identify_ids(
    lidar_dir: &Path,
    dem_dir: &Path,
    output: &Path,
) -> Result<Vec<TankId>, AppError> {
    for dir in [lidar_dir, dem_dir] {
        if !dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                what: "input directory",
                path: dir.to_path_buf(),
            }
            .into());
        }
    }
    let lidar = TankPathIndex::build(
        DataKind::Lidar,
        SourceSpec::Directory(lidar_dir.to_path_buf()).resolve(DataKind::Lidar)?,
    );
    let dem = TankPathIndex::build(
        DataKind::Dem,
        SourceSpec::Directory(dem_dir.to_path_buf()).resolve(DataKind::Dem)?,
    );

    let mut ids = lidar.common_ids(&dem);
    ids.sort_by(numeric_order);
    write_tank_ids(output, &ids)?;
    log::info!(
        "{} tanks with lidar and DEM ({} lidar, {} DEM) written to {}",
        ids.len(),
        lidar.len(),
        dem.len(),
        output.display()
    );
    Ok(ids)
}

/// Integer order when both IDs are integers, text order otherwise.
fn numeric_order(a: &TankId, b: &TankId) -> Ordering {
    match (a.as_str().parse::<u64>(), b.as_str().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}
