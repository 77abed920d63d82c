use num_traits::AsPrimitive;

use crate::{
    geometry::Point,
    verboser::{Message, Verboser},
    Float, Grid,
};

/// Less than three pins leave no legal move once the previous pin is excluded.
pub const MIN_PIN_COUNT: usize = 3;

/// Pins evenly spaced on a circle, indexed counterclockwise in image space
/// (clockwise on screen) from the positive x axis.
#[derive(Clone, Debug)]
pub struct PinTable<S> {
    pins: Vec<Point<S>>,
    center: Point<S>,
    radius: S,
}

impl<S: Float> PinTable<S>
where
    usize: AsPrimitive<S>,
{
    pub fn circle(
        center: Point<S>,
        radius: S,
        pin_count: usize,
        verboser: &mut impl Verboser,
    ) -> Result<Self, Error> {
        if pin_count < MIN_PIN_COUNT {
            return Err(Error::MinPinCount(pin_count));
        }
        let pins = (0..pin_count)
            .map(|i| {
                verboser.verbose(Message::PlacingPin(i));
                let theta: S = S::TWO * S::PI * i.as_() / pin_count.as_();
                center
                    + Point {
                        x: theta.cos(),
                        y: theta.sin(),
                    } * radius
            })
            .collect();
        Ok(Self {
            pins,
            center,
            radius,
        })
    }

    /// Pins on the circle inscribed in `grid`, one pixel inside its border.
    pub fn inscribed(
        grid: Grid,
        pin_count: usize,
        verboser: &mut impl Verboser,
    ) -> Result<Self, Error> {
        let center = Point::from(grid).as_::<S>() * S::HALF;
        let radius = num_traits::Float::min(center.x, center.y) - S::ONE;
        Self::circle(center, radius, pin_count, verboser)
    }
}

impl<S> PinTable<S> {
    pub fn pins(&self) -> &[Point<S>] {
        &self.pins
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Point<S>> {
        self.pins.get(index)
    }

    pub fn center(&self) -> &Point<S> {
        &self.center
    }

    pub fn radius(&self) -> &S {
        &self.radius
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("At least 3 pins are required, got {0}")]
    MinPinCount(usize),
}
