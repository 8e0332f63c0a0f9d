use crate::color::Color;
use crate::drawing::Segment;

pub type Point = (i32, i32);

/// Lazily walks the 8-connected Bresenham line from `start` to `end`,
/// both endpoints included.
#[derive(Debug, Clone)]
pub struct BresenhamLine {
    x: i64,
    y: i64,
    end: (i64, i64),
    dx: i64,
    dy: i64,
    sx: i64,
    sy: i64,
    err: i64,
    done: bool,
}

impl BresenhamLine {
    pub fn new(start: Point, end: Point) -> Self {
        let (x0, y0) = (start.0 as i64, start.1 as i64);
        let (x1, y1) = (end.0 as i64, end.1 as i64);
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        Self {
            x: x0,
            y: y0,
            end: (x1, y1),
            dx,
            dy,
            sx: if x0 < x1 { 1 } else { -1 },
            sy: if y0 < y1 { 1 } else { -1 },
            err: dx - dy,
            done: false,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.done {
            return None;
        }
        // Every intermediate value lies between the two i32 endpoints.
        let current = (self.x as i32, self.y as i32);
        if (self.x, self.y) == self.end {
            self.done = true;
            return Some(current);
        }

        let e2 = 2 * self.err;
        if e2 > -self.dy {
            self.err -= self.dy;
            self.x += self.sx;
        }
        if e2 < self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = (self.end.0 - self.x).abs().max((self.end.1 - self.y).abs()) as usize + 1;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BresenhamLine {}

pub fn line_points(start: Point, end: Point) -> BresenhamLine {
    BresenhamLine::new(start, end)
}

// One segment per point, each running to (x + 1, y + 1). Saved drawings
// depend on this shape.
pub fn stroke_segments(
    start: Point,
    end: Point,
    color: &Color,
    width: u32,
) -> impl Iterator<Item = Segment> + '_ {
    line_points(start, end).map(move |(x, y)| {
        Segment::new(
            [x, y, x.saturating_add(1), y.saturating_add(1)],
            color.clone(),
            width,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_connected(start: Point, end: Point) {
        let points: Vec<Point> = line_points(start, end).collect();
        assert_eq!(points.first(), Some(&start));
        assert_eq!(points.last(), Some(&end));
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!((a.0 - b.0).abs() <= 1 && (a.1 - b.1).abs() <= 1, "{:?} -> {:?}", a, b);
            assert_ne!(a, b);
        }
        let expected = (end.0 - start.0).abs().max((end.1 - start.1).abs()) as usize + 1;
        assert_eq!(points.len(), expected);
    }

    #[test]
    fn test_lines_are_connected_in_every_octant() {
        let origin = (0, 0);
        for &end in &[
            (7, 3), (3, 7), (-3, 7), (-7, 3),
            (-7, -3), (-3, -7), (3, -7), (7, -3),
            (5, 5), (-5, 5), (0, 9), (9, 0), (0, -9), (-9, 0),
        ] {
            assert_connected(origin, end);
        }
        assert_connected((-40, 12), (17, -31));
        assert_connected((100, 100), (101, 250));
    }

    #[test]
    fn test_single_point() {
        let points: Vec<Point> = line_points((4, -2), (4, -2)).collect();
        assert_eq!(points, vec![(4, -2)]);
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let mut line = line_points((i32::MIN, 0), (i32::MAX, 0));
        assert_eq!(line.next(), Some((i32::MIN, 0)));
        assert_eq!(line.len(), u32::MAX as usize);
    }

    #[test]
    fn test_size_hint_matches_count() {
        let line = line_points((3, 1), (-12, 8));
        let hint = line.len();
        assert_eq!(line.count(), hint);
    }

    #[test]
    fn test_horizontal_stroke_segments() {
        let red = Color::named("red");
        let segments: Vec<Segment> = stroke_segments((10, 10), (20, 10), &red, 3).collect();
        assert_eq!(segments.len(), 11);
        for (i, segment) in segments.iter().enumerate() {
            let x = 10 + i as i32;
            assert_eq!(segment.coords(), [x, 10, x + 1, 11]);
            assert_eq!(segment.color(), &red);
            assert_eq!(segment.width(), 3);
        }
    }
}
