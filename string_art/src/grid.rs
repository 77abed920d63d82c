use num_traits::{NumCast, Unsigned};

use crate::{
    geometry::{Point, Segment},
    Float,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Grid<T = usize> {
    pub height: T,
    pub width: T,
}

impl<T> Grid<T> {
    pub fn new(height: T, width: T) -> Self {
        Self { height, width }
    }
}

impl Grid {
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rasterizes the straight line between `start` and `end`.
    ///
    /// Both ends are rounded to the nearest pixel and every pixel stepped on is
    /// returned once, in traversal order from `start` to `end`. Pixels outside
    /// of the grid are dropped. The line is always stepped from its smaller end,
    /// so swapping `start` and `end` yields the same pixels in reverse order.
    pub fn trace_pixels<F: Float>(&self, start: Point<F>, end: Point<F>) -> Vec<Point<usize>> {
        let Some((flipped, pixels)) = self.walk(start, end) else {
            return Vec::new();
        };
        let mut pixels: Vec<_> = pixels.collect();
        if flipped {
            pixels.reverse();
        }
        pixels
    }

    /// Same as [`Self::trace_pixels`] but yields buffer indexes.
    pub fn trace_indexes<F: Float>(&self, start: Point<F>, end: Point<F>) -> Vec<usize> {
        self.trace_pixels(start, end)
            .into_iter()
            .map(|point| point.y * self.width + point.x)
            .collect()
    }

    /// Buffer indexes of the pixels [`Self::trace_pixels`] returns, without
    /// allocating. The order is the same for both directions of the line.
    pub fn line_indexes<F: Float>(
        &self,
        start: Point<F>,
        end: Point<F>,
    ) -> impl Iterator<Item = usize> + '_ {
        let width = self.width;
        self.walk(start, end)
            .into_iter()
            .flat_map(|(_, pixels)| pixels)
            .map(move |point| point.y * width + point.x)
    }

    /// Steps the line from its smaller end after clipping it to the grid
    /// grown by one pixel on every side, so the work never exceeds the grid
    /// size whatever the ends. The flag tells whether the ends were swapped.
    fn walk<F: Float>(
        &self,
        start: Point<F>,
        end: Point<F>,
    ) -> Option<(bool, impl Iterator<Item = Point<usize>> + '_)> {
        let flipped = end < start;
        let segment = Segment::new(start, end);
        let segment = if flipped { segment.reversed() } else { segment };
        let max = Point::new(
            num_traits::cast::<usize, F>(self.width)?,
            num_traits::cast::<usize, F>(self.height)?,
        );
        let segment = segment
            .clip(Point::new(-F::ONE, -F::ONE), max)?
            .round()
            .cast::<isize>()?;
        let pixels = segment
            .points_between()
            .filter_map(|point| point.cast::<usize>())
            .filter(move |&point| self.index_of(point).is_some());
        Some((flipped, pixels))
    }
}

impl<T: NumCast + Unsigned + PartialOrd + Copy> Grid<T> {
    pub fn index_of(&self, point: Point<T>) -> Option<T> {
        if point.x < self.width && point.y < self.height {
            Some(point.y * self.width + point.x)
        } else {
            None
        }
    }
}
