use super::Point;
use crate::Float;
use bresenham::Bresenham;
use std::iter;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment<T> {
    pub start: Point<T>,
    pub end: Point<T>,
}

impl<T> Segment<T> {
    pub fn new(start: Point<T>, end: Point<T>) -> Self {
        Self { start, end }
    }

    pub fn reversed(self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }
}

impl<T: Float> Segment<T> {
    pub fn length(&self) -> T {
        self.start.distance(&self.end)
    }

    /// Returns this segment shifted `distance` units along its left normal.
    ///
    /// The caller must ensure the segment is not degenerate, otherwise the
    /// result is made of NaN.
    pub fn parallel_at_distance(&self, distance: T) -> Self {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let length = num_traits::Float::sqrt(dx * dx + dy * dy);
        let ux = dx / length;
        let uy = dy / length;

        let offset_x = -uy * distance;
        let offset_y = ux * distance;

        let new_start = Point {
            x: self.start.x + offset_x,
            y: self.start.y + offset_y,
        };
        let new_end = Point {
            x: self.end.x + offset_x,
            y: self.end.y + offset_y,
        };

        Segment::new(new_start, new_end)
    }

    /// Liang-Barsky clipping against the rectangle spanned by `min` and `max`.
    ///
    /// Ends already inside the rectangle are kept bit for bit and cut ends lie
    /// exactly on the edge they cross. Returns `None` when the segment misses
    /// the rectangle or has a non finite coordinate.
    pub fn clip(&self, min: Point<T>, max: Point<T>) -> Option<Self> {
        let coords = [self.start.x, self.start.y, self.end.x, self.end.y];
        if !coords.iter().all(|coord| coord.is_finite()) {
            return None;
        }
        let delta = self.end - self.start;
        let mut enter = (T::ZERO, None);
        let mut exit = (T::ONE, None);
        for (p, q, edge) in [
            (-delta.x, self.start.x - min.x, Edge::X(min.x)),
            (delta.x, max.x - self.start.x, Edge::X(max.x)),
            (-delta.y, self.start.y - min.y, Edge::Y(min.y)),
            (delta.y, max.y - self.start.y, Edge::Y(max.y)),
        ] {
            if p == T::ZERO {
                if q < T::ZERO {
                    return None;
                }
                continue;
            }
            let ratio = q / p;
            if p < T::ZERO {
                if ratio > enter.0 {
                    enter = (ratio, Some(edge));
                }
            } else if ratio < exit.0 {
                exit = (ratio, Some(edge));
            }
        }
        if enter.0 > exit.0 {
            return None;
        }
        let cut = |(ratio, edge): (T, Option<Edge<T>>), end: Point<T>| match edge {
            None => end,
            Some(edge) => edge.snap(self.start + delta * ratio),
        };
        Some(Self {
            start: cut(enter, self.start),
            end: cut(exit, self.end),
        })
    }

    pub fn round(&self) -> Self {
        Self {
            start: self.start.round(),
            end: self.end.round(),
        }
    }
}

#[derive(Clone, Copy)]
enum Edge<T> {
    X(T),
    Y(T),
}

impl<T> Edge<T> {
    fn snap(self, mut point: Point<T>) -> Point<T> {
        match self {
            Edge::X(x) => point.x = x,
            Edge::Y(y) => point.y = y,
        }
        point
    }
}

impl<T: num_traits::NumCast> Segment<T> {
    pub fn cast<I: num_traits::NumCast>(self) -> Option<Segment<I>> {
        self.start
            .cast()
            .and_then(|start| self.end.cast().map(|end| Segment { start, end }))
    }
}

impl Segment<isize> {
    /// Every lattice point from `start` to `end`, both included.
    pub fn points_between(&self) -> impl Iterator<Item = Point<isize>> {
        // Bresenham stops right before the end point.
        Bresenham::new((self.start.x, self.start.y), (self.end.x, self.end.y))
            .map(|(x, y)| Point { x, y })
            .chain(iter::once(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_between_includes_both_ends() {
        let segment = Segment::new(Point::new(2, 3), Point::new(7, 5));
        let points: Vec<_> = segment.points_between().collect();
        assert_eq!(points.first(), Some(&Point::new(2, 3)));
        assert_eq!(points.last(), Some(&Point::new(7, 5)));
        assert_eq!(points.len(), 6);
    }

    #[test]
    fn degenerate_segment_is_a_single_point() {
        let segment = Segment::new(Point::new(4, 4), Point::new(4, 4));
        assert_eq!(segment.points_between().collect::<Vec<_>>(), [Point::new(4, 4)]);
    }

    #[test]
    fn clip_keeps_inner_segments_untouched() {
        let segment = Segment::new(Point::new(0.3f64, 7.9), Point::new(12.1, 4.4));
        let clipped = segment.clip(Point::new(-1.0, -1.0), Point::new(20.0, 20.0));
        assert_eq!(clipped, Some(segment));
    }

    #[test]
    fn clip_cuts_at_the_borders() {
        let segment = Segment::new(Point::new(-1e12f64, 5.0), Point::new(1e12, 5.0));
        let clipped = segment
            .clip(Point::new(-1.0, -1.0), Point::new(20.0, 20.0))
            .unwrap();
        assert_eq!(clipped, Segment::new(Point::new(-1.0, 5.0), Point::new(20.0, 5.0)));
    }

    #[test]
    fn clip_rejects_missing_and_non_finite_segments() {
        let (min, max) = (Point::new(-1.0f32, -1.0), Point::new(20.0, 20.0));
        assert_eq!(Segment::new(Point::new(-5.0, 30.0), Point::new(40.0, 25.0)).clip(min, max), None);
        assert_eq!(Segment::new(Point::new(-3.0, 5.0), Point::new(-3.0, 5.0)).clip(min, max), None);
        assert_eq!(Segment::new(Point::new(f32::NAN, 5.0), Point::new(3.0, 5.0)).clip(min, max), None);
        assert_eq!(
            Segment::new(Point::new(f32::NEG_INFINITY, 5.0), Point::new(3.0, 5.0)).clip(min, max),
            None
        );
    }

    #[test]
    fn parallel_keeps_direction_and_moves_by_distance() {
        let segment = Segment::new(Point::new(0.0f64, 0.0), Point::new(10.0, 0.0));
        let parallel = segment.parallel_at_distance(2.0);
        assert_eq!(parallel.start, Point::new(0.0, 2.0));
        assert_eq!(parallel.end, Point::new(10.0, 2.0));
    }
}
