use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::color::Color;
use crate::drawing::Segment;
use crate::error::StoreError;
use crate::raster::line_points;

/// Receives rendering commands from the drawing session
pub trait Surface {
    fn render_segment(&mut self, segment: &Segment);
    fn clear_surface(&mut self);
}

pub struct RasterSurface {
    image: RgbaImage,
    background: Rgba<u8>,
    dirty: bool,
}

fn rgba(color: &Color) -> Rgba<u8> {
    let (r, g, b) = color.to_rgb();
    Rgba([r, g, b, 255])
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, background: &Color) -> Self {
        let background = rgba(background);
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), background),
            background,
            dirty: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw RGBA8 rows, top to bottom
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        (x < self.width() && y < self.height()).then(|| self.image.get_pixel(x, y).0)
    }

    /// Reallocates the buffer blank. Callers replay the drawing afterwards.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) != (self.width(), self.height()) {
            self.image = RgbaImage::from_pixel(width, height, self.background);
            self.dirty = true;
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn export_png(&self, path: &Path) -> Result<(), StoreError> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| StoreError::Export {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!("Exported {}x{} image to {}", self.width(), self.height(), path.display());
        Ok(())
    }

    // A disc wider than this covers the whole buffer from anywhere it can
    // touch it, so larger widths render the same.
    fn max_stamp_width(&self) -> u32 {
        (self.width() as u64 + self.height() as u64 + 2)
            .saturating_mul(2)
            .min(u32::MAX as u64) as u32
    }

    /// Fills a disc of diameter `width` centred on (x, y), visiting only the
    /// part of its bounding square that lies on the buffer.
    fn stamp(&mut self, x: i32, y: i32, width: u32, color: Rgba<u8>) {
        let lo = -((width as i64 - 1) / 2);
        let hi = width as i64 / 2;
        let center = (lo + hi) as f64 / 2.0;
        let radius_sq = (width as f64 / 2.0).powi(2) + 0.25;

        let (x, y) = (x as i64, y as i64);
        let (w, h) = (self.width() as i64, self.height() as i64);
        let (ox_lo, ox_hi) = (lo.max(-x), hi.min(w - 1 - x));
        let (oy_lo, oy_hi) = (lo.max(-y), hi.min(h - 1 - y));

        for oy in oy_lo..=oy_hi {
            for ox in ox_lo..=ox_hi {
                let (fx, fy) = (ox as f64 - center, oy as f64 - center);
                if fx * fx + fy * fy <= radius_sq {
                    self.image.put_pixel((x + ox) as u32, (y + oy) as u32, color);
                }
            }
        }
    }

    /// Clips `start..end` to the buffer grown by `pad` on every side.
    /// Returns `None` when nothing of the line can reach the buffer.
    fn clip(&self, start: (i32, i32), end: (i32, i32), pad: i64) -> Option<((i32, i32), (i32, i32))> {
        let min = (-pad) as f64;
        let max_x = (self.width() as i64 - 1 + pad) as f64;
        let max_y = (self.height() as i64 - 1 + pad) as f64;
        let inside = |(x, y): (i32, i32)| {
            (min..=max_x).contains(&(x as f64)) && (min..=max_y).contains(&(y as f64))
        };
        if inside(start) && inside(end) {
            return Some((start, end));
        }

        // Liang-Barsky against the padded rectangle
        let (x0, y0) = (start.0 as f64, start.1 as f64);
        let (dx, dy) = (end.0 as f64 - x0, end.1 as f64 - y0);
        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        for (p, q) in [(-dx, x0 - min), (dx, max_x - x0), (-dy, y0 - min), (dy, max_y - y0)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }
        let at = |t: f64| ((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
        Some((at(t0), at(t1)))
    }
}

impl Surface for RasterSurface {
    fn render_segment(&mut self, segment: &Segment) {
        let color = rgba(segment.color());
        let width = segment.width().min(self.max_stamp_width());
        let pad = width as i64 / 2 + 1;
        if let Some((start, end)) = self.clip(segment.start(), segment.end(), pad) {
            for (x, y) in line_points(start, end) {
                self.stamp(x, y, width, color);
            }
        }
        self.dirty = true;
    }

    fn clear_surface(&mut self) {
        let background = self.background;
        self.image.pixels_mut().for_each(|p| *p = background);
        self.dirty = true;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::tests::TempPath;

    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub rendered: Vec<Segment>,
        pub clears: usize,
    }

    impl Surface for RecordingSurface {
        fn render_segment(&mut self, segment: &Segment) {
            self.rendered.push(segment.clone());
        }

        fn clear_surface(&mut self) {
            self.rendered.clear();
            self.clears += 1;
        }
    }

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];

    #[test]
    fn test_render_and_clear() {
        let mut surface = RasterSurface::new(20, 20, &Color::named("white"));
        surface.render_segment(&Segment::new([5, 5, 6, 6], Color::named("red"), 1));

        assert_eq!(surface.pixel(5, 5), Some(RED));
        assert_eq!(surface.pixel(6, 6), Some(RED));
        assert_eq!(surface.pixel(6, 5), Some(WHITE));

        surface.clear_surface();
        assert_eq!(surface.pixel(5, 5), Some(WHITE));
    }

    #[test]
    fn test_width_covers_neighbours() {
        let mut surface = RasterSurface::new(20, 20, &Color::named("white"));
        surface.render_segment(&Segment::new([10, 10, 10, 10], Color::named("red"), 3));

        for (x, y) in [(9, 10), (11, 10), (10, 9), (10, 11), (10, 10)] {
            assert_eq!(surface.pixel(x, y), Some(RED), "({}, {})", x, y);
        }
        assert_eq!(surface.pixel(12, 10), Some(WHITE));
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut surface = RasterSurface::new(4, 4, &Color::named("white"));
        surface.render_segment(&Segment::new([-10, -10, 100, 100], Color::named("red"), 5));
        assert_eq!(surface.pixel(0, 0), Some(RED));
        assert_eq!(surface.pixel(4, 4), None);
    }

    #[test]
    fn test_resize_and_dirty_flag() {
        let mut surface = RasterSurface::new(4, 4, &Color::named("white"));
        assert!(surface.take_dirty());
        assert!(!surface.take_dirty());

        surface.resize(8, 2);
        assert_eq!((surface.width(), surface.height()), (8, 2));
        assert_eq!(surface.pixels().len(), 8 * 2 * 4);
        assert!(surface.take_dirty());
    }

    #[test]
    fn test_export_png() {
        let path = TempPath::new("png");
        let mut surface = RasterSurface::new(8, 8, &Color::named("white"));
        surface.render_segment(&Segment::new([1, 1, 2, 2], Color::named("blue"), 1));
        surface.export_png(&path.0).unwrap();

        let bytes = std::fs::read(&path.0).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_huge_width_renders_promptly() {
        let mut surface = RasterSurface::new(4, 4, &Color::named("white"));
        surface.render_segment(&Segment::new([0, 0, 1, 1], Color::named("red"), u32::MAX));
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(surface.pixel(x, y), Some(RED), "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_far_segments_are_clipped() {
        let mut surface = RasterSurface::new(4, 4, &Color::named("white"));
        surface.render_segment(&Segment::new(
            [-2_000_000_000, 1, 2_000_000_000, 1],
            Color::named("red"),
            1,
        ));
        assert_eq!(surface.pixel(0, 1), Some(RED));
        assert_eq!(surface.pixel(3, 1), Some(RED));
        assert_eq!(surface.pixel(0, 0), Some(WHITE));

        // Entirely off the buffer: nothing drawn
        surface.clear_surface();
        surface.render_segment(&Segment::new(
            [i32::MIN, i32::MIN, i32::MAX, i32::MIN],
            Color::named("red"),
            u32::MAX,
        ));
        assert_eq!(surface.pixel(0, 0), Some(WHITE));
    }
}
