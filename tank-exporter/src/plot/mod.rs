//! Per-tank composite plot.
//!
//! One JPEG per tank with a grid of panels: the imagery crop, the DEM, the
//! bare-earth and lidar Z scatters, one difference scatter per height
//! statistic, a Z histogram with the statistic cut-offs, and a colour bar.
//! Every panel is coloured through the terrain map; elevation panels share
//! one value range and difference panels another.

pub mod canvas;
pub mod colormap;

use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use ab_glyph::FontRef;
use coordinate_transformer::{reproject, Crs};
use height_estimator::{
    filter::{NoDataFilter, PointFilter},
    statistic::round2,
    EstimateError, FilterBuilder, HeightEstimate, HeightEstimator, HeightStatistic,
};
use image::{codecs::jpeg::JpegEncoder, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut},
    rect::Rect,
};
use tank_core::{
    is_no_data,
    lidar::{LidarDataset, LidarPoint},
    raster::DemRaster,
    tank::TankId,
};

use self::{
    canvas::{blit_fit, draw_frame, draw_label, place, Panel, Viewport},
    colormap::{terrain, ColorScale},
};
use crate::error::ExportError;

/// Directory used when a tank has no `object_class`.
pub const UNCLASSIFIED: &str = "unclassified";

/// DejaVu Sans, see `assets/DejaVuSans-LICENSE`.
pub(crate) const LABEL_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const PANEL_COUNT: u32 = 4 + HeightStatistic::ALL.len() as u32 + 2;

#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub panel_size: u32,
    pub columns: u32,
    /// Gap between panels and around the grid.
    pub margin: u32,
    /// Inset of scatter plots inside their panel.
    pub padding: u32,
    /// Height of the title strip above each panel.
    pub label_height: u32,
    pub point_radius: u32,
    pub histogram_bins: usize,
    pub background: Rgb<u8>,
    pub frame: Rgb<u8>,
    pub text: Rgb<u8>,
    /// Colour of the cut-off lines on the histogram.
    pub marker: Rgb<u8>,
    pub jpeg_quality: u8,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            panel_size: 320,
            columns: 4,
            margin: 12,
            padding: 10,
            label_height: 24,
            point_radius: 2,
            histogram_bins: 40,
            background: Rgb([255, 255, 255]),
            frame: Rgb([160, 160, 160]),
            text: Rgb([20, 20, 20]),
            marker: Rgb([200, 30, 30]),
            jpeg_quality: 90,
        }
    }
}

impl PlotConfig {
    fn panel(&self, index: u32) -> Panel {
        let columns = self.columns.max(1);
        let cell_height = self.label_height + self.panel_size + self.margin;
        Panel {
            x: self.margin + (index % columns) * (self.panel_size + self.margin),
            y: self.margin + (index / columns) * cell_height + self.label_height,
            size: self.panel_size,
        }
    }

    /// Canvas size for the full grid.
    pub fn dimensions(&self) -> (u32, u32) {
        let columns = self.columns.max(1);
        let rows = PANEL_COUNT.div_ceil(columns);
        (
            columns * self.panel_size + (columns + 1) * self.margin,
            rows * (self.label_height + self.panel_size) + (rows + 1) * self.margin,
        )
    }
}

/// `<plot_dir>/<object_class>/<tank_id>.jpg`
pub fn plot_path(plot_dir: &Path, object_class: Option<&str>, tank_id: &TankId) -> PathBuf {
    let class = object_class
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(UNCLASSIFIED);
    plot_dir.join(class).join(format!("{tank_id}.jpg"))
}

/// Title of a difference panel: the statistic and its height rounded to
/// centimetres.
pub fn height_title(
    statistic: HeightStatistic,
    estimate: &Result<HeightEstimate, EstimateError>,
) -> String {
    match estimate {
        Ok(estimate) => format!("{statistic}: H = {:.2}", round2(estimate.value)),
        Err(_) => format!("{statistic}: no points"),
    }
}

pub struct TankPlot<'a> {
    tank_id: TankId,
    object_class: Option<String>,
    /// Records with x/y in the plotting CRS.
    points: Vec<LidarPoint>,
    dem: &'a DemRaster,
    imagery: Option<&'a RgbImage>,
}

impl<'a> TankPlot<'a> {
    /// Scatter positions are reprojected into the tank's `utm_projection`;
    /// without one the points stay in `lidar_crs`.
    pub fn new(
        tank_id: &TankId,
        lidar: &LidarDataset,
        lidar_crs: &Crs,
        dem: &'a DemRaster,
        imagery: Option<&'a RgbImage>,
    ) -> Result<Self, ExportError> {
        let target = lidar
            .metadata
            .utm_projection
            .as_deref()
            .map(Crs::new)
            .unwrap_or_else(|| lidar_crs.clone());
        let projected = reproject(lidar_crs, &target, &lidar.xy())?;
        let points = lidar
            .points
            .iter()
            .zip(projected)
            .map(|(p, (x, y))| LidarPoint { x, y, ..*p })
            .collect();

        Ok(Self {
            tank_id: tank_id.clone(),
            object_class: lidar.metadata.object_class.clone(),
            points,
            dem,
            imagery,
        })
    }

    pub fn render(&self, config: &PlotConfig) -> Result<RgbImage, ExportError> {
        let font = FontRef::try_from_slice(LABEL_FONT)?;
        let (width, height) = config.dimensions();
        let mut canvas = RgbImage::from_pixel(width, height, config.background);

        let valid_z = || self.points.iter().map(|p| p.z).filter(|z| !is_no_data(*z));
        let valid_bee = || {
            self.points
                .iter()
                .filter_map(|p| p.bare_earth_elevation)
                .filter(|v| !is_no_data(*v))
        };
        let dem_range = self
            .dem
            .value_range()
            .map(|(lo, hi)| vec![lo, hi])
            .unwrap_or_default();
        let elevation =
            ColorScale::from_values(dem_range.into_iter().chain(valid_z()).chain(valid_bee()))
                .unwrap_or(ColorScale { min: 0.0, max: 1.0 });
        let difference = ColorScale::from_values(
            self.points.iter().filter_map(LidarPoint::lpc_bee_difference),
        )
        .unwrap_or(ColorScale { min: 0.0, max: 1.0 });

        let mut index = 0;
        let mut next_panel = |canvas: &mut RgbImage, title: &str| {
            let panel = config.panel(index);
            index += 1;
            draw_label(
                canvas,
                &font,
                panel.x,
                panel.y - config.label_height,
                panel.size,
                config.label_height,
                title,
                config.text,
            );
            panel
        };

        let panel = next_panel(&mut canvas, "Imagery");
        if let Some(imagery) = self.imagery {
            blit_fit(&mut canvas, panel, imagery);
        }
        draw_frame(&mut canvas, panel, config.frame);

        let panel = next_panel(&mut canvas, "DEM");
        blit_fit(&mut canvas, panel, &self.dem_image(&elevation, config.background));
        draw_frame(&mut canvas, panel, config.frame);

        let coords: Vec<_> = self.points.iter().map(|p| (p.x, p.y)).collect();
        let bee: Vec<_> = self
            .points
            .iter()
            .filter_map(|p| match p.bare_earth_elevation {
                Some(v) if !is_no_data(v) => Some((p.x, p.y, v)),
                _ => None,
            })
            .collect();
        let panel = next_panel(&mut canvas, "Bare earth elevation");
        self.scatter(&mut canvas, config, panel, &coords, &bee, &elevation);

        let z: Vec<_> = self
            .points
            .iter()
            .filter(|p| !is_no_data(p.z))
            .map(|p| (p.x, p.y, p.z))
            .collect();
        let panel = next_panel(&mut canvas, "LiDAR Z");
        self.scatter(&mut canvas, config, panel, &coords, &z, &elevation);

        for stat in HeightStatistic::ALL {
            let selected: Vec<_> = stat
                .build()
                .filter(self.points.clone())
                .iter()
                .filter_map(|p| p.lpc_bee_difference().map(|d| (p.x, p.y, d)))
                .collect();
            let estimate = HeightEstimator::new(stat).estimate(&self.points);
            if estimate.is_err() {
                log::debug!("tank {}: no points for the {stat} panel", self.tank_id);
            }
            let panel = next_panel(&mut canvas, &height_title(stat, &estimate));
            self.scatter(&mut canvas, config, panel, &coords, &selected, &difference);
        }

        let panel = next_panel(&mut canvas, "Z histogram");
        self.histogram(&mut canvas, config, panel, &elevation);

        let panel = next_panel(&mut canvas, "Difference (m)");
        color_bar(&mut canvas, config, panel, &font, &difference);

        Ok(canvas)
    }

    /// Renders and writes the JPEG; returns its path.
    pub fn save(&self, plot_dir: &Path, config: &PlotConfig) -> Result<PathBuf, ExportError> {
        let path = plot_path(plot_dir, self.object_class.as_deref(), &self.tank_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ExportError::io(parent))?;
        }
        let image = self.render(config)?;

        let file = File::create(&path).map_err(ExportError::io(&path))?;
        let mut writer = BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut writer, config.jpeg_quality)
            .encode_image(&image)
            .map_err(|source| ExportError::Image {
                path: path.clone(),
                source,
            })?;
        log::debug!("tank {}: plot written to {}", self.tank_id, path.display());
        Ok(path)
    }

    fn dem_image(&self, scale: &ColorScale, background: Rgb<u8>) -> RgbImage {
        RgbImage::from_fn(self.dem.width() as u32, self.dem.height() as u32, |x, y| {
            match self.dem.get(y as usize, x as usize) {
                Some(v) if !self.dem.is_no_data(v) => scale.color(v),
                _ => background,
            }
        })
    }

    fn scatter(
        &self,
        canvas: &mut RgbImage,
        config: &PlotConfig,
        panel: Panel,
        extent: &[(f64, f64)],
        values: &[(f64, f64, f64)],
        scale: &ColorScale,
    ) {
        let mut layer = panel.layer(config.background);
        if let Some(viewport) = Viewport::fit(extent, panel.local(), config.padding) {
            let radius = config.point_radius as i32;
            for &(x, y, v) in values {
                let centre = viewport.to_pixel(x, y);
                draw_filled_circle_mut(&mut layer, centre, radius, scale.color(v));
            }
        }
        place(canvas, panel, &layer);
        draw_frame(canvas, panel, config.frame);
    }

    fn histogram(
        &self,
        canvas: &mut RgbImage,
        config: &PlotConfig,
        panel: Panel,
        scale: &ColorScale,
    ) {
        draw_frame(canvas, panel, config.frame);
        let valid = NoDataFilter.filter(self.points.clone());
        let z: Vec<f64> = valid.iter().map(|p| p.z).collect();
        let Some(range) = ColorScale::from_values(z.iter().copied()) else {
            return;
        };

        let bins = config.histogram_bins.max(1);
        let mut counts = vec![0usize; bins];
        for &v in &z {
            let bin = (range.normalize(v) * bins as f64) as usize;
            counts[bin.min(bins - 1)] += 1;
        }
        let max_count = counts.iter().copied().max().unwrap_or(0).max(1);

        let inner = panel.size.saturating_sub(2 * config.padding);
        if inner == 0 {
            return;
        }
        let (left, bottom) = (panel.x + config.padding, panel.y + config.padding + inner);
        let bar_width = (inner / bins as u32).max(1);
        let span = range.max - range.min;
        for (i, &count) in counts.iter().enumerate() {
            let bar_height = (count as f64 / max_count as f64 * inner as f64).round() as u32;
            if bar_height == 0 {
                continue;
            }
            let centre = range.min + span * (i as f64 + 0.5) / bins as f64;
            let x = left + i as u32 * bar_width;
            let bar = Rect::at(x as i32, (bottom - bar_height) as i32).of_size(bar_width, bar_height);
            draw_filled_rect_mut(canvas, bar, scale.color(centre));
        }

        for stat in HeightStatistic::ALL {
            let Some(cut) = stat.threshold().and_then(|t| t.value(&z)) else {
                continue;
            };
            let x = left + (range.normalize(cut) * (bar_width * bins as u32) as f64) as u32;
            let x = x.min(left + inner - 1) as f32;
            draw_line_segment_mut(
                canvas,
                (x, (bottom - inner) as f32),
                (x, (bottom - 1) as f32),
                config.marker,
            );
        }
    }
}

/// Vertical terrain ramp with the difference range written at its ends.
fn color_bar(
    canvas: &mut RgbImage,
    config: &PlotConfig,
    panel: Panel,
    font: &FontRef<'_>,
    scale: &ColorScale,
) {
    draw_frame(canvas, panel, config.frame);
    let inner = panel.size.saturating_sub(2 * config.padding);
    let width = panel.size / 4;
    if inner == 0 || width == 0 {
        return;
    }
    let x = panel.x + panel.size * 3 / 8;
    let top = panel.y + config.padding;
    for row in 0..inner {
        let t = 1.0 - row as f64 / (inner.max(2) - 1) as f64;
        let line = Rect::at(x as i32, (top + row) as i32).of_size(width, 1);
        draw_filled_rect_mut(canvas, line, terrain(t));
    }

    let text_x = x + width + config.padding / 2;
    let text_width = (panel.x + panel.size).saturating_sub(text_x + 1);
    let text_height = config.label_height * 3 / 4;
    for (y, value) in [
        (top, scale.max),
        ((top + inner).saturating_sub(text_height), scale.min),
    ] {
        draw_label(
            canvas,
            font,
            text_x,
            y,
            text_width,
            text_height,
            &format!("{:.2}", round2(value)),
            config.text,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tank_core::{geojson::FeatureCollection, raster::GeoTransform};

    fn lidar() -> LidarDataset {
        let features: Vec<_> = (0..20)
            .map(|i| {
                let (x, y) = (-98.0 + 0.0001 * (i % 5) as f64, 30.0 - 0.0001 * (i / 5) as f64);
                let bee = if i == 3 { -999999.0 } else { 98.0 };
                json!({
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [x, y] },
                    "properties": {
                        "X coordinate": x, "Y coordinate": y, "Z coordinate": 100.0 + i as f64,
                        "bare_earth_elevation": bee,
                        "utm_projection": "EPSG:4326", "object_class": "closed_roof_tank"
                    }
                })
            })
            .collect();
        let fc: FeatureCollection =
            serde_json::from_value(json!({ "type": "FeatureCollection", "features": features }))
                .unwrap();
        LidarDataset::from_collection(fc).unwrap()
    }

    fn dem() -> DemRaster {
        DemRaster::new(
            2,
            2,
            vec![97.0, 98.0, 99.0, -999999.0],
            GeoTransform::north_up(-98.0, 30.0, 0.0005, 0.0005),
        )
        .unwrap()
    }

    fn small() -> PlotConfig {
        PlotConfig {
            panel_size: 64,
            margin: 4,
            padding: 4,
            label_height: 12,
            histogram_bins: 8,
            ..PlotConfig::default()
        }
    }

    #[test]
    fn path_is_grouped_by_object_class() {
        let id = TankId::new("12");
        assert_eq!(
            plot_path(Path::new("plots"), Some("closed_roof_tank"), &id),
            Path::new("plots/closed_roof_tank/12.jpg")
        );
        assert_eq!(
            plot_path(Path::new("plots"), None, &id),
            Path::new("plots/unclassified/12.jpg")
        );
    }

    #[test]
    fn grid_has_a_panel_per_view() {
        assert_eq!(PANEL_COUNT, 12);
        let config = small();
        assert_eq!(config.dimensions(), (4 * 64 + 5 * 4, 3 * (12 + 64) + 4 * 4));
        // the title strip sits between the margin and the panel
        assert_eq!(config.panel(0).y, 4 + 12);
        assert_eq!(config.panel(4).y, 4 + 12 + 64 + 4 + 12);
    }

    #[test]
    fn render_without_imagery_leaves_first_panel_blank() {
        let (lidar, dem) = (lidar(), dem());
        let plot = TankPlot::new(&TankId::new("12"), &lidar, &Crs::wgs84(), &dem, None).unwrap();
        let config = small();
        let image = plot.render(&config).unwrap();

        let first = config.panel(0);
        let centre = (first.x + first.size / 2, first.y + first.size / 2);
        assert_eq!(image.get_pixel(centre.0, centre.1), &config.background);

        let dem_panel = config.panel(1);
        let centre = (dem_panel.x + dem_panel.size / 4, dem_panel.y + dem_panel.size / 4);
        assert_ne!(image.get_pixel(centre.0, centre.1), &config.background);
    }

    #[test]
    fn saved_plot_is_a_jpeg_at_the_class_path() {
        let dir = tempfile::tempdir().unwrap();
        let (lidar, dem) = (lidar(), dem());
        let imagery = RgbImage::from_pixel(30, 20, Rgb([10, 120, 40]));
        let plot =
            TankPlot::new(&TankId::new("12"), &lidar, &Crs::wgs84(), &dem, Some(&imagery)).unwrap();
        let config = small();
        let path = plot.save(dir.path(), &config).unwrap();

        assert_eq!(path, dir.path().join("closed_roof_tank").join("12.jpg"));
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), config.dimensions());
    }

    #[test]
    fn difference_titles_show_the_rounded_height() {
        let estimate = Ok(HeightEstimate {
            statistic: HeightStatistic::Median,
            value: 12.345678,
            points_used: 4,
        });
        assert_eq!(
            height_title(HeightStatistic::Median, &estimate),
            "median: H = 12.35"
        );
        let empty = Err(EstimateError::EmptySelection {
            statistic: HeightStatistic::Q90,
        });
        assert_eq!(height_title(HeightStatistic::Q90, &empty), "q90: no points");
    }

    #[test]
    fn every_panel_gets_a_title() {
        let (lidar, dem) = (lidar(), dem());
        let plot = TankPlot::new(&TankId::new("12"), &lidar, &Crs::wgs84(), &dem, None).unwrap();
        let config = small();
        let image = plot.render(&config).unwrap();

        for index in 0..PANEL_COUNT {
            let panel = config.panel(index);
            let strip_top = panel.y - config.label_height;
            let inked = (strip_top..panel.y)
                .flat_map(|y| (panel.x..panel.x + panel.size).map(move |x| (x, y)))
                .any(|(x, y)| image.get_pixel(x, y) != &config.background);
            assert!(inked, "panel {index} has no title");
        }
    }

    #[test]
    fn scatter_points_stay_inside_their_panel() {
        let (lidar, dem) = (lidar(), dem());
        let plot = TankPlot::new(&TankId::new("12"), &lidar, &Crs::wgs84(), &dem, None).unwrap();
        let config = PlotConfig {
            point_radius: 20,
            ..small()
        };
        let image = plot.render(&config).unwrap();

        // margin column right of the Z scatter
        let panel = config.panel(3);
        let gap_x = panel.x + panel.size;
        for y in panel.y..panel.y + panel.size {
            assert_eq!(image.get_pixel(gap_x, y), &config.background);
        }
    }
}
