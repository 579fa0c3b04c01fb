use std::path::Path;

use image::RgbImage;
use tank_core::lidar::PixelBounds;

use crate::error::ParseError;

/// Loads an image tile and crops it to `bounds`, clamped to the tile size.
/// An empty crop yields a 0x0 image.
pub fn read_tile_crop(path: &Path, bounds: PixelBounds) -> Result<RgbImage, ParseError> {
    let tile = image::open(path)
        .map_err(|source| ParseError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    Ok(crop(&tile, bounds))
}

pub fn crop(tile: &RgbImage, bounds: PixelBounds) -> RgbImage {
    let (w, h) = tile.dimensions();
    let x0 = bounds.min_x.min(w);
    let y0 = bounds.min_y.min(h);
    let x1 = bounds.max_x.clamp(x0, w);
    let y1 = bounds.max_y.clamp(y0, h);
    image::imageops::crop_imm(tile, x0, y0, x1 - x0, y1 - y0).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn crop_is_clamped_to_tile() {
        let tile = RgbImage::from_fn(8, 6, |x, y| Rgb([x as u8, y as u8, 0]));
        let out = crop(
            &tile,
            PixelBounds {
                min_x: 5,
                min_y: 2,
                max_x: 20,
                max_y: 4,
            },
        );
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(out.get_pixel(0, 0), &Rgb([5, 2, 0]));

        let empty = crop(
            &tile,
            PixelBounds {
                min_x: 10,
                min_y: 10,
                max_x: 12,
                max_y: 12,
            },
        );
        assert_eq!(empty.dimensions(), (0, 0));
    }

    #[test]
    fn reads_and_crops_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        RgbImage::from_pixel(4, 4, Rgb([9, 9, 9])).save(&path).unwrap();
        let out = read_tile_crop(
            &path,
            PixelBounds {
                min_x: 1,
                min_y: 1,
                max_x: 3,
                max_y: 4,
            },
        )
        .unwrap();
        assert_eq!(out.dimensions(), (2, 3));
    }
}
