//! Resolution of per-tank input files.
//!
//! Each kind of per-tank data comes either from an explicit list file or from
//! a directory scan. Tank IDs are derived from file names with a single rule
//! (see [`extract_tank_id`]) and indexed once, so a lookup either yields one
//! path or fails with an error naming the tank and the data kind.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use tank_core::tank::TankId;

use crate::{
    error::SourceError,
    parsers::{list::read_path_list, Extension},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Lidar,
    Dem,
    Imagery,
}

impl DataKind {
    /// Glob used when the source is a directory.
    pub fn pattern(self) -> &'static str {
        match self {
            DataKind::Lidar => "*.geojson",
            DataKind::Dem | DataKind::Imagery => "*.tif",
        }
    }

    fn accepts(self, extension: Extension) -> bool {
        match self {
            DataKind::Lidar => matches!(extension, Extension::GeoJson | Extension::Json),
            DataKind::Dem => extension == Extension::Tif,
            DataKind::Imagery => {
                matches!(extension, Extension::Tif | Extension::Jpg | Extension::Png)
            }
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataKind::Lidar => "lidar",
            DataKind::Dem => "DEM",
            DataKind::Imagery => "imagery",
        })
    }
}

/// Where the files of one data kind come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    List(PathBuf),
    Directory(PathBuf),
}

impl SourceSpec {
    /// Picks whichever of the two is set. Both set, or neither, is `None`.
    pub fn from_options(list: Option<PathBuf>, dir: Option<PathBuf>) -> Option<Self> {
        match (list, dir) {
            (Some(list), None) => Some(Self::List(list)),
            (None, Some(dir)) => Some(Self::Directory(dir)),
            _ => None,
        }
    }

    pub fn resolve(&self, kind: DataKind) -> Result<Vec<PathBuf>, SourceError> {
        let paths = match self {
            SourceSpec::List(list) => read_path_list(list)?,
            SourceSpec::Directory(dir) => {
                let pattern = dir.join(kind.pattern()).to_string_lossy().into_owned();
                let entries = glob::glob(&pattern).map_err(|source| SourceError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                let mut paths = Vec::new();
                for entry in entries {
                    match entry {
                        Ok(path) => paths.push(path),
                        Err(e) => log::warn!("skipping unreadable {kind} entry: {e}"),
                    }
                }
                paths
            }
        };

        Ok(paths
            .into_iter()
            .filter(|path| match Extension::of(path) {
                Ok(ext) if kind.accepts(ext) => true,
                _ => {
                    log::warn!("skipping {}: not a {kind} file", path.display());
                    false
                }
            })
            .collect())
    }
}

fn digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

/// The tank ID of a per-tank file is the first run of ASCII digits in its
/// file name: `DEM_data_tank_id_42_EPSG4326.tif` -> `42`.
pub fn extract_tank_id(path: &Path) -> Option<TankId> {
    let name = path.file_name()?.to_str()?;
    digit_run().find(name).map(|m| TankId::new(m.as_str()))
}

/// Tank ID to file path, built once per data kind.
#[derive(Debug, Clone)]
pub struct TankPathIndex {
    kind: DataKind,
    entries: BTreeMap<TankId, Vec<PathBuf>>,
}

impl TankPathIndex {
    pub fn build(kind: DataKind, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut entries: BTreeMap<TankId, Vec<PathBuf>> = BTreeMap::new();
        for path in paths {
            match extract_tank_id(&path) {
                Some(id) => {
                    let list = entries.entry(id).or_default();
                    if !list.contains(&path) {
                        list.push(path);
                    }
                }
                None => log::warn!("{}: no tank id in {kind} file name", path.display()),
            }
        }
        Self { kind, entries }
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, tank_id: &TankId) -> Result<&Path, SourceError> {
        match self.entries.get(tank_id).map(Vec::as_slice) {
            None | Some([]) => Err(SourceError::Unmatched {
                tank_id: tank_id.clone(),
                kind: self.kind,
            }),
            Some([path]) => Ok(path.as_path()),
            Some(paths) => Err(SourceError::Ambiguous {
                tank_id: tank_id.clone(),
                kind: self.kind,
                paths: paths.to_vec(),
            }),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &TankId> {
        self.entries.keys()
    }

    /// IDs present in both indexes, in ascending order.
    pub fn common_ids(&self, other: &TankPathIndex) -> Vec<TankId> {
        self.ids()
            .filter(|id| other.entries.contains_key(*id))
            .cloned()
            .collect()
    }
}

/// Image tiles addressed by file stem, which is what lidar records store in
/// their `tile_name` column.
#[derive(Debug, Clone, Default)]
pub struct TileIndex {
    tiles: HashMap<String, Vec<PathBuf>>,
}

impl TileIndex {
    pub fn build(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut tiles: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            tiles.entry(stem.to_string()).or_default().push(path);
        }
        Self { tiles }
    }

    pub fn get(&self, tile_name: &str) -> Result<&Path, SourceError> {
        match self.tiles.get(tile_name).map(Vec::as_slice) {
            None | Some([]) => Err(SourceError::UnmatchedTile {
                tile_name: tile_name.to_string(),
            }),
            Some([path]) => Ok(path.as_path()),
            Some(paths) => Err(SourceError::AmbiguousTile {
                tile_name: tile_name.to_string(),
                paths: paths.to_vec(),
            }),
        }
    }
}
