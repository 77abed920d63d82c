use std::ops::{Add, Mul, Sub};

use num_traits::AsPrimitive;

use crate::{Float, Grid};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> Add for Point<T>
where
    T: Add<Output = T>,
{
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Point {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl<T> Sub for Point<T>
where
    T: Sub<Output = T>,
{
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Point {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl<T> Mul<T> for Point<T>
where
    T: Mul<Output = T> + Clone,
{
    type Output = Self;

    fn mul(self, scalar: T) -> Self {
        Point {
            x: self.x * scalar.clone(),
            y: self.y * scalar,
        }
    }
}

impl<T: Float> Point<T> {
    pub fn sq_distance(&self, other: &Self) -> T {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Self) -> T {
        num_traits::Float::sqrt(self.sq_distance(other))
    }

    /// Rounds half up on both axes, so `0.5` becomes `1` and `-0.5` becomes `0`.
    pub fn round(&self) -> Self {
        Self {
            x: (self.x + T::HALF).floor(),
            y: (self.y + T::HALF).floor(),
        }
    }
}

impl<S: num_traits::NumCast> Point<S> {
    pub fn cast<I: num_traits::NumCast>(self) -> Option<Point<I>> {
        num_traits::cast(self.x).and_then(|x| num_traits::cast(self.y).map(|y| Point { x, y }))
    }
}

impl<S> Point<S> {
    pub fn as_<I: Copy + 'static>(self) -> Point<I>
    where
        S: AsPrimitive<I>,
    {
        Point {
            x: self.x.as_(),
            y: self.y.as_(),
        }
    }
}

impl<T> From<Grid<T>> for Point<T> {
    fn from(grid: Grid<T>) -> Self {
        Point {
            x: grid.width,
            y: grid.height,
        }
    }
}
