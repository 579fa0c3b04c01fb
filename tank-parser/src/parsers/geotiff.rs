//! Single-band GeoTIFF DEM reader.
//!
//! Georeferencing comes from the GeoTIFF tags (ModelTransformation, or
//! ModelTiepoint + ModelPixelScale), the CRS from the GeoKey directory and
//! the no-data value from the GDAL_NODATA ASCII tag.

use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::{Path, PathBuf},
};

use tiff::{
    decoder::{Decoder, DecodingResult},
    tags::Tag,
};

use tank_core::raster::{DemRaster, GeoTransform};

use super::Parser;
use crate::error::ParseError;

const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

pub struct DemParser {
    pub filename: PathBuf,
}

impl Parser for DemParser {
    type Output = DemRaster;

    fn parse(&self) -> Result<DemRaster, ParseError> {
        read_dem(&self.filename)
    }
}

pub fn read_dem(path: &Path) -> Result<DemRaster, ParseError> {
    let tiff_err = |source| ParseError::Tiff {
        path: path.to_path_buf(),
        source,
    };
    let geo_err = |message: String| ParseError::GeoTiff {
        path: path.to_path_buf(),
        message,
    };

    let file = File::open(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(tiff_err)?;

    let (width, height) = decoder.dimensions().map_err(tiff_err)?;
    let (width, height) = (width as usize, height as usize);

    let geokeys = read_geokeys(&mut decoder).map_err(tiff_err)?;
    let transform = read_transform(&mut decoder, &geokeys)
        .map_err(tiff_err)?
        .ok_or_else(|| geo_err("no georeferencing tags".to_string()))?;
    let no_data = read_no_data(&mut decoder).map_err(tiff_err)?;

    let raw: Vec<f64> = match decoder.read_image().map_err(tiff_err)? {
        DecodingResult::F64(v) => v,
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        _ => return Err(geo_err("unsupported sample format".to_string())),
    };

    let total = width * height;
    if total == 0 || raw.len() % total != 0 {
        return Err(geo_err(format!(
            "{} samples for a {width}x{height} raster",
            raw.len()
        )));
    }
    // Interleaved bands: keep band 1.
    let bands = raw.len() / total;
    let data = if bands > 1 {
        log::debug!("{}: {bands} bands, using the first", path.display());
        raw.into_iter().step_by(bands).collect()
    } else {
        raw
    };

    let epsg = geokeys.epsg();
    DemRaster::new(width, height, data, transform)
        .map(|dem| dem.with_no_data(no_data).with_epsg(epsg))
        .map_err(|source| ParseError::Model {
            path: path.to_path_buf(),
            source,
        })
}

#[derive(Debug, Default)]
struct GeoKeys {
    raster_type: Option<u16>,
    geographic: Option<u16>,
    projected: Option<u16>,
}

impl GeoKeys {
    fn epsg(&self) -> Option<u16> {
        self.projected
            .or(self.geographic)
            .filter(|&code| code != 0 && code != USER_DEFINED)
    }
}

fn read_geokeys<R: Read + Seek>(decoder: &mut Decoder<R>) -> tiff::TiffResult<GeoKeys> {
    let mut keys = GeoKeys::default();
    let Some(directory) = decoder.find_tag(Tag::GeoKeyDirectoryTag)? else {
        return Ok(keys);
    };
    let directory = directory.into_u16_vec()?;

    // header: version, revision, minor revision, key count; then 4-tuples of
    // (key id, tag location, count, value). Location 0 means inline value.
    let count = directory.get(3).copied().unwrap_or(0) as usize;
    for entry in directory.get(4..).unwrap_or_default().chunks_exact(4).take(count) {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 {
            continue;
        }
        match key {
            GT_RASTER_TYPE_GEO_KEY => keys.raster_type = Some(value),
            GEOGRAPHIC_TYPE_GEO_KEY => keys.geographic = Some(value),
            PROJECTED_CS_TYPE_GEO_KEY => keys.projected = Some(value),
            _ => {}
        }
    }
    Ok(keys)
}

fn read_transform<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    geokeys: &GeoKeys,
) -> tiff::TiffResult<Option<GeoTransform>> {
    let mut transform = if let Some(m) = decoder.find_tag(Tag::ModelTransformationTag)? {
        let m = m.into_f64_vec()?;
        if m.len() < 16 {
            return Ok(None);
        }
        GeoTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]])
    } else {
        let scale = decoder.find_tag(Tag::ModelPixelScaleTag)?;
        let tie = decoder.find_tag(Tag::ModelTiepointTag)?;
        let (Some(scale), Some(tie)) = (scale, tie) else {
            return Ok(None);
        };
        let (scale, tie) = (scale.into_f64_vec()?, tie.into_f64_vec()?);
        if scale.len() < 2 || tie.len() < 6 {
            return Ok(None);
        }
        let (res_x, res_y) = (scale[0], scale[1]);
        let origin_x = tie[3] - tie[0] * res_x;
        let origin_y = tie[4] + tie[1] * res_y;
        GeoTransform::north_up(origin_x, origin_y, res_x, res_y)
    };

    // Tie points address pixel centres; move the origin to the corner.
    if geokeys.raster_type == Some(RASTER_PIXEL_IS_POINT) {
        transform.origin_x -= 0.5 * (transform.pixel_width + transform.row_rotation);
        transform.origin_y -= 0.5 * (transform.col_rotation + transform.pixel_height);
    }
    Ok(Some(transform))
}

fn read_no_data<R: Read + Seek>(decoder: &mut Decoder<R>) -> tiff::TiffResult<Option<f64>> {
    let Some(value) = decoder.find_tag(Tag::GdalNodata)? else {
        return Ok(None);
    };
    let text = value.into_string()?;
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match text.parse::<f64>() {
        Ok(v) => Ok(Some(v)),
        Err(_) if text.eq_ignore_ascii_case("nan") => Ok(Some(f64::NAN)),
        Err(_) => {
            log::warn!("ignoring unparsable GDAL_NODATA value {text:?}");
            Ok(None)
        }
    }
}
