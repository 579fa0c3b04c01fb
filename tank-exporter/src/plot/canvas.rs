//! Raster drawing helpers for the composite plot, on top of `imageproc`.

use ab_glyph::{FontRef, PxScale};
use image::{imageops, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_text_mut, text_size},
    rect::Rect,
};

/// A square cell of the panel grid, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panel {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl Panel {
    /// The same panel with its top-left corner at the origin, for drawing
    /// into a panel-sized layer.
    pub fn local(&self) -> Panel {
        Panel {
            x: 0,
            y: 0,
            size: self.size,
        }
    }

    pub fn rect(&self) -> Option<Rect> {
        (self.size > 0)
            .then(|| Rect::at(self.x as i32, self.y as i32).of_size(self.size, self.size))
    }

    pub fn layer(&self, background: Rgb<u8>) -> RgbImage {
        RgbImage::from_pixel(self.size, self.size, background)
    }
}

pub fn draw_frame(canvas: &mut RgbImage, panel: Panel, color: Rgb<u8>) {
    if let Some(rect) = panel.rect() {
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Copies a panel-sized layer onto the canvas. Whatever was drawn into the
/// layer cannot spill into a neighbouring panel.
pub fn place(canvas: &mut RgbImage, panel: Panel, layer: &RgbImage) {
    imageops::replace(canvas, layer, panel.x as i64, panel.y as i64);
}

/// Scales `image` to fit inside `panel` keeping its aspect ratio, centred.
pub fn blit_fit(canvas: &mut RgbImage, panel: Panel, image: &RgbImage) {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || panel.size == 0 {
        return;
    }
    let scale = f64::min(panel.size as f64 / w as f64, panel.size as f64 / h as f64);
    let nw = ((w as f64 * scale).round() as u32).clamp(1, panel.size);
    let nh = ((h as f64 * scale).round() as u32).clamp(1, panel.size);
    let resized = imageops::resize(image, nw, nh, imageops::FilterType::Nearest);
    let ox = panel.x + (panel.size - nw) / 2;
    let oy = panel.y + (panel.size - nh) / 2;
    imageops::overlay(canvas, &resized, ox as i64, oy as i64);
}

/// Draws one line of text with its top-left corner at (x, y), shrunk to
/// `max_width` when it would be wider.
#[allow(clippy::too_many_arguments)]
pub fn draw_label(
    canvas: &mut RgbImage,
    font: &FontRef<'_>,
    x: u32,
    y: u32,
    max_width: u32,
    height: u32,
    text: &str,
    color: Rgb<u8>,
) {
    if text.is_empty() || max_width == 0 || height == 0 {
        return;
    }
    let mut scale = PxScale::from(height as f32 * 0.8);
    let (width, _) = text_size(scale, font, text);
    if width > max_width {
        let shrink = max_width as f32 / width as f32;
        scale = PxScale::from(scale.y * shrink);
    }
    draw_text_mut(canvas, color, x as i32, y as i32, scale, font, text);
}

/// Maps world coordinates into a panel, north up, keeping the aspect ratio.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    min_x: f64,
    max_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    pub fn fit(coords: &[(f64, f64)], panel: Panel, padding: u32) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = coords
            .iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .fold(None, |acc: Option<(f64, f64, f64, f64)>, &(x, y)| match acc {
                None => Some((x, y, x, y)),
                Some((a, b, c, d)) => Some((a.min(x), b.min(y), c.max(x), d.max(y))),
            })?;
        let inner = panel.size.saturating_sub(2 * padding).max(1) as f64;
        let span = f64::max(max_x - min_x, max_y - min_y);
        let scale = if span > 0.0 { inner / span } else { 1.0 };
        Some(Self {
            min_x,
            max_y,
            scale,
            offset_x: panel.x as f64 + padding as f64 + (inner - (max_x - min_x) * scale) / 2.0,
            offset_y: panel.y as f64 + padding as f64 + (inner - (max_y - min_y) * scale) / 2.0,
        })
    }

    pub fn to_pixel(&self, x: f64, y: f64) -> (i32, i32) {
        (
            (self.offset_x + (x - self.min_x) * self.scale).floor() as i32,
            (self.offset_y + (self.max_y - y) * self.scale).floor() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_circle_mut;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn font() -> FontRef<'static> {
        FontRef::try_from_slice(crate::plot::LABEL_FONT).unwrap()
    }

    #[test]
    fn layers_keep_drawing_inside_their_panel() {
        let mut canvas = RgbImage::from_pixel(20, 10, WHITE);
        let panel = Panel { x: 0, y: 0, size: 10 };
        let mut layer = panel.layer(WHITE);
        draw_filled_circle_mut(&mut layer, (9, 5), 3, BLACK);
        place(&mut canvas, panel, &layer);
        assert_eq!(canvas.get_pixel(9, 5), &BLACK);
        assert_eq!(canvas.get_pixel(7, 5), &BLACK);
        // right of the panel edge
        assert_eq!(canvas.get_pixel(10, 5), &WHITE);
    }

    #[test]
    fn frame_outlines_the_panel() {
        let mut canvas = RgbImage::from_pixel(12, 12, WHITE);
        draw_frame(&mut canvas, Panel { x: 1, y: 1, size: 10 }, BLACK);
        assert_eq!(canvas.get_pixel(1, 1), &BLACK);
        assert_eq!(canvas.get_pixel(10, 10), &BLACK);
        assert_eq!(canvas.get_pixel(5, 5), &WHITE);
        assert_eq!(canvas.get_pixel(0, 0), &WHITE);

        // zero-sized panels draw nothing
        draw_frame(&mut canvas, Panel { x: 0, y: 0, size: 0 }, BLACK);
        assert_eq!(canvas.get_pixel(0, 0), &WHITE);
    }

    #[test]
    fn viewport_is_north_up() {
        let panel = Panel { x: 100, y: 0, size: 100 };
        let vp = Viewport::fit(&[(0.0, 0.0), (10.0, 10.0)], panel, 0).unwrap();
        assert_eq!(vp.to_pixel(0.0, 10.0), (100, 0));
        assert_eq!(vp.to_pixel(5.0, 5.0), (150, 50));
        assert!(Viewport::fit(&[], panel, 0).is_none());
    }

    #[test]
    fn blit_keeps_aspect_ratio() {
        let mut canvas = RgbImage::from_pixel(40, 40, WHITE);
        let image = RgbImage::from_pixel(4, 2, BLACK);
        blit_fit(&mut canvas, Panel { x: 0, y: 0, size: 40 }, &image);
        assert_eq!(canvas.get_pixel(20, 9), &WHITE);
        assert_eq!(canvas.get_pixel(20, 10), &BLACK);
        assert_eq!(canvas.get_pixel(20, 29), &BLACK);
        assert_eq!(canvas.get_pixel(20, 30), &WHITE);
    }

    #[test]
    fn long_labels_are_shrunk_to_fit() {
        let font = font();
        let mut canvas = RgbImage::from_pixel(200, 20, WHITE);
        draw_label(
            &mut canvas,
            &font,
            0,
            0,
            60,
            20,
            "median: H = 12.35 with a long tail",
            BLACK,
        );

        let inked = |x: u32| (0..20).any(|y| canvas.get_pixel(x, y) != &WHITE);
        assert!((0..60).any(inked));
        assert!(!(70..200).any(inked));
    }
}
