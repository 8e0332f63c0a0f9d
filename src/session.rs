use std::path::Path;

use crate::color::Color;
use crate::drawing::Drawing;
use crate::error::StoreError;
use crate::raster::{Point, stroke_segments};
use crate::settings::Settings;
use crate::store;
use crate::surface::{RasterSurface, Surface};

/// A pointer drag in progress. Color and width are fixed when it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: u32,
    pub eraser: bool,
    pub last_point: Point,
}

fn clamp_width(width: u32, settings: &Settings) -> u32 {
    width.min(settings.max_width).max(settings.min_width).max(1)
}

pub struct Session {
    settings: Settings,
    drawing: Drawing,
    color: Color,
    width: u32,
    eraser_on: bool,
    fill_on: bool,
    stroke: Option<Stroke>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            color: settings.default_color.clone(),
            width: clamp_width(settings.default_width, &settings),
            drawing: Drawing::new(),
            eraser_on: false,
            fill_on: false,
            stroke: None,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn eraser_on(&self) -> bool {
        self.eraser_on
    }

    pub fn fill_on(&self) -> bool {
        self.fill_on
    }

    pub fn stroke(&self) -> Option<&Stroke> {
        self.stroke.as_ref()
    }

    pub fn new_surface(&self) -> RasterSurface {
        let [width, height] = self.settings.canvas_size;
        RasterSurface::new(width, height, &self.settings.background)
    }

    /// Starts a stroke. A stroke that is somehow still active just restarts here.
    pub fn pointer_down(&mut self, x: i32, y: i32) {
        if self.stroke.is_some() {
            log::debug!("Pointer down during an active stroke, restarting at ({}, {})", x, y);
        }
        let color = if self.eraser_on {
            self.settings.eraser_color.clone()
        } else {
            self.color.clone()
        };
        self.stroke = Some(Stroke {
            color,
            width: self.width,
            eraser: self.eraser_on,
            last_point: (x, y),
        });
    }

    /// Extends the active stroke to (x, y), appending and rendering one
    /// segment per rasterized point. Returns how many were added.
    pub fn pointer_move(&mut self, x: i32, y: i32, surface: &mut impl Surface) -> usize {
        let Some(stroke) = self.stroke.as_mut() else {
            return 0;
        };

        let before = self.drawing.len();
        for segment in stroke_segments(stroke.last_point, (x, y), &stroke.color, stroke.width) {
            surface.render_segment(&segment);
            self.drawing.push(segment);
        }
        stroke.last_point = (x, y);
        self.drawing.len() - before
    }

    pub fn pointer_up(&mut self, x: i32, y: i32) {
        if self.stroke.take().is_some() {
            log::debug!("Stroke ended at ({}, {}), {} segments total", x, y, self.drawing.len());
        }
    }

    /// Selects a drawing color and leaves eraser and fill mode.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.eraser_on = false;
        self.fill_on = false;
    }

    /// Result of the color picker. `None` means the dialog was cancelled.
    pub fn pick_color(&mut self, picked: Option<Color>) {
        if let Some(color) = picked {
            self.color = color;
        }
    }

    /// Sets the stroke width, clamped to the configured range.
    pub fn set_width(&mut self, width: u32) {
        let clamped = clamp_width(width, &self.settings);
        if clamped != width {
            log::debug!("Width {} clamped to {}", width, clamped);
        }
        self.width = clamped;
    }

    pub fn toggle_eraser(&mut self) {
        self.eraser_on = !self.eraser_on;
        self.fill_on = false;
    }

    pub fn toggle_fill(&mut self) {
        self.fill_on = !self.fill_on;
        self.eraser_on = false;
    }

    /// Saves the drawing. `None` means the dialog was cancelled.
    pub fn request_save(&self, path: Option<&Path>) -> Result<(), StoreError> {
        match path {
            Some(path) => store::save(&self.drawing, path),
            None => Ok(()),
        }
    }

    /// Loads a drawing, replacing the current one and redrawing `surface`.
    /// Both are left untouched if the file cannot be read or parsed.
    pub fn request_load(
        &mut self,
        path: Option<&Path>,
        surface: &mut impl Surface,
    ) -> Result<(), StoreError> {
        let Some(path) = path else {
            return Ok(());
        };
        let drawing = store::load(path)?;
        self.stroke = None;
        self.drawing = drawing;
        self.drawing.replay(surface);
        Ok(())
    }

    pub fn replay(&self, surface: &mut impl Surface) {
        self.drawing.replay(surface);
    }
}
