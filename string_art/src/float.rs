use std::{
    fmt::{Debug, Display},
    ops::{AddAssign, DivAssign, MulAssign, SubAssign},
};

use num_traits::{ConstOne, ConstZero};

pub trait Float:
    'static
    + Display
    + Debug
    + Sync
    + Send
    + Into<svg::node::Value>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + num_traits::Float
    + num_traits::NumCast
    + ConstZero
    + ConstOne
{
    const HALF: Self;
    const EPSILON: Self;
    const TWO: Self;
    const PI: Self;
    const TWO_FIVE_FIVE: Self;
    /// Base of the exponential that turns a contrast level into a sigmoid slope.
    const CONTRAST_BASE: Self;
}

impl Float for f32 {
    const HALF: Self = 0.5;
    const EPSILON: Self = f32::EPSILON;
    const TWO: Self = 2.0;
    const PI: Self = core::f32::consts::PI;
    const TWO_FIVE_FIVE: Self = 255.0;
    const CONTRAST_BASE: Self = 1.03;
}

impl Float for f64 {
    const HALF: Self = 0.5;
    const EPSILON: Self = f64::EPSILON;
    const TWO: Self = 2.0;
    const PI: Self = core::f64::consts::PI;
    const TWO_FIVE_FIVE: Self = 255.0;
    const CONTRAST_BASE: Self = 1.03;
}
