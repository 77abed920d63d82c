use num_traits::AsPrimitive;

use crate::{
    geometry::{Point, Segment},
    image::Luminance,
    Float, Grid,
};

/// Pixels covered by a thick line, all sharing the same intensity.
///
/// The line is traced once along its axis and again at perpendicular offsets no
/// more than half a pixel apart, up to half the width on each side. Offsets
/// beyond the grid diagonal cannot reach any pixel and are not traced.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeMask<S> {
    indexes: Vec<usize>,
    intensity: S,
}

impl<S: Float> StrokeMask<S>
where
    usize: AsPrimitive<S>,
{
    pub fn new(grid: &Grid, start: Point<S>, end: Point<S>, width: S, intensity: S) -> Self {
        let segment = Segment::new(start, end);
        let diagonal = Point::from(*grid).as_::<S>().distance(&Point::new(S::ZERO, S::ZERO));
        let half = ((width - S::ONE) * S::HALF).max(S::ZERO).min(diagonal);
        let mut indexes = grid.trace_indexes(start, end);
        if half > S::ZERO && segment.length() > S::EPSILON {
            let steps = (half * S::TWO).ceil().to_usize().unwrap_or(0);
            for step in 1..=steps {
                let offset = half * step.as_() / steps.as_();
                for side in [offset, -offset] {
                    let parallel = segment.parallel_at_distance(side);
                    indexes.extend(grid.trace_indexes(parallel.start, parallel.end));
                }
            }
            indexes.sort_unstable();
            indexes.dedup();
        }
        Self { indexes, intensity }
    }
}

impl<S: Float> StrokeMask<S> {
    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }

    pub fn intensity(&self) -> S {
        self.intensity
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, S)> + '_ {
        self.indexes.iter().map(|&index| (index, self.intensity))
    }

    /// Removes the stroke intensity from every covered sample, never going below zero.
    pub fn subtract_from(&self, buffer: &mut Luminance<S>) {
        let pixels = buffer.pixels_mut();
        for (index, intensity) in self.iter() {
            if let Some(sample) = pixels.get_mut(index) {
                *sample = (*sample - intensity).max(S::ZERO);
            }
        }
    }

    /// Lays the stroke over `buffer` as a translucent black thread of opacity `intensity`.
    pub fn darken(&self, buffer: &mut Luminance<S>) {
        let pixels = buffer.pixels_mut();
        for (index, opacity) in self.iter() {
            if let Some(sample) = pixels.get_mut(index) {
                *sample *= S::ONE - opacity;
            }
        }
    }
}
