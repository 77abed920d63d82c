use serde::{Deserialize, Serialize};

use crate::{image::Contrast, pins::MIN_PIN_COUNT, Float};

/// Parameters frozen for the whole life of one run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig<S> {
    /// Number of pins around the circle.
    pub pins: usize,
    /// Maximum number of lines to draw.
    pub lines: usize,
    /// Darkness removed from the working buffer under every drawn line.
    pub line_weight: S,
    /// Thread width in pixels.
    pub line_width: S,
    /// Contrast level fed to the preprocessing sigmoid.
    pub contrast: S,
    /// Exponent applied to the chord length when scoring, zero disables it.
    pub distance_bias: S,
}

impl<S: Float> RunConfig<S> {
    pub fn validate(&self) -> Result<(), Error> {
        if self.pins < MIN_PIN_COUNT {
            return Err(Error::MinPinCount(self.pins));
        }
        if !(self.line_width.is_finite() && self.line_width > S::ZERO) {
            return Err(Error::LineWidth(self.line_width.to_string()));
        }
        for (name, value) in [
            ("line weight", self.line_weight),
            ("contrast", self.contrast),
            ("distance bias", self.distance_bias),
        ] {
            if !value.is_finite() {
                return Err(Error::NotFinite(name));
            }
        }
        Ok(())
    }

    pub fn contrast(&self) -> Contrast<S> {
        Contrast::new(self.contrast)
    }
}

impl<S: Float> Default for RunConfig<S> {
    fn default() -> Self {
        Self {
            pins: 288,
            lines: 4000,
            line_weight: num_traits::cast(20).unwrap_or(S::ONE),
            line_width: S::ONE,
            contrast: S::ZERO,
            distance_bias: S::ZERO,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("At least 3 pins are required, got {0}")]
    MinPinCount(usize),
    #[error("Line width must be a positive number, got {0}")]
    LineWidth(String),
    #[error("The {0} must be a finite number")]
    NotFinite(&'static str),
    #[error("The image must not be empty")]
    EmptyImage,
}
