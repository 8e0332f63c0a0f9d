use crate::color::Color;
use crate::surface::Surface;

/// One rendered line primitive. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    coords: [i32; 4],
    color: Color,
    width: u32,
}

impl Segment {
    /// Creates a segment from `[x1, y1, x2, y2]`. A zero width is raised to 1.
    pub fn new(coords: [i32; 4], color: Color, width: u32) -> Self {
        Self {
            coords,
            color,
            width: width.max(1),
        }
    }

    pub fn coords(&self) -> [i32; 4] {
        self.coords
    }

    pub fn start(&self) -> (i32, i32) {
        (self.coords[0], self.coords[1])
    }

    pub fn end(&self) -> (i32, i32) {
        (self.coords[2], self.coords[3])
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}

/// The canvas content: segments in draw order. Later segments paint over
/// earlier ones, so the order is preserved everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drawing {
    segments: Vec<Segment>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn replay(&self, surface: &mut impl Surface) {
        surface.clear_surface();
        for segment in &self.segments {
            surface.render_segment(segment);
        }
    }
}

impl FromIterator<Segment> for Drawing {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl Extend<Segment> for Drawing {
    fn extend<I: IntoIterator<Item = Segment>>(&mut self, iter: I) {
        self.segments.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Drawing {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
