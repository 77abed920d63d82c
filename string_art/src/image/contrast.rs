use crate::Float;

use super::Luminance;

/// Inverts luminance and pushes it through a logistic curve whose slope grows
/// exponentially with the contrast level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contrast<S> {
    pub level: S,
    pub base: S,
}

impl<S: Float> Contrast<S> {
    pub fn new(level: S) -> Self {
        Self {
            level,
            base: S::CONTRAST_BASE,
        }
    }

    pub fn with_base(level: S, base: S) -> Self {
        Self { level, base }
    }

    pub fn slope(&self) -> S {
        self.base.powf(self.level)
    }

    /// Maps a raw sample to its darkness: black becomes high, white becomes low.
    pub fn apply(&self, raw: S) -> S {
        sigmoid(self.slope(), raw)
    }

    pub fn process(&self, raw: &Luminance<S>) -> Luminance<S> {
        let slope = self.slope();
        raw.map(|&sample| sigmoid(slope, sample))
    }
}

fn sigmoid<S: Float>(slope: S, raw: S) -> S {
    let inverted = S::TWO_FIVE_FIVE - raw;
    let value =
        S::TWO_FIVE_FIVE / (S::ONE + (-slope * (inverted / S::TWO_FIVE_FIVE - S::HALF)).exp());
    value.max(S::ZERO).min(S::TWO_FIVE_FIVE)
}

/// A raw grayscale image and the darkness buffer derived from it.
///
/// The raw samples are kept untouched so that changing the contrast always
/// starts again from them.
#[derive(Clone, Debug)]
pub struct Source<S> {
    raw: Luminance<S>,
    contrast: Contrast<S>,
    processed: Luminance<S>,
}

impl<S: Float> Source<S> {
    pub fn new(raw: Luminance<S>, contrast: Contrast<S>) -> Self {
        let processed = contrast.process(&raw);
        Self {
            raw,
            contrast,
            processed,
        }
    }

    pub fn set_contrast(&mut self, contrast: Contrast<S>) {
        if self.contrast != contrast {
            self.processed = contrast.process(&self.raw);
            self.contrast = contrast;
        }
    }

    pub fn raw(&self) -> &Luminance<S> {
        &self.raw
    }

    pub fn contrast(&self) -> Contrast<S> {
        self.contrast
    }

    pub fn processed(&self) -> &Luminance<S> {
        &self.processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{image::PixelBuffer, Grid};

    fn gradient() -> Luminance<f64> {
        PixelBuffer::new(|p| (p.x * 16 + p.y) as f64, Grid::new(16, 16))
    }

    #[test]
    fn black_is_darker_than_white() {
        let contrast = Contrast::new(20.0f64);
        assert!(contrast.apply(0.0) > contrast.apply(255.0));
        assert!(contrast.apply(0.0) <= 255.0);
        assert!(contrast.apply(255.0) >= 0.0);
    }

    #[test]
    fn mid_gray_is_near_the_middle() {
        let value = Contrast::new(0.0f64).apply(127.5);
        assert!((value - 127.5).abs() < 1e-9);
    }

    #[test]
    fn higher_level_spreads_values() {
        let soft = Contrast::new(0.0f64);
        let hard = Contrast::new(80.0f64);
        assert!(hard.apply(0.0) > soft.apply(0.0));
        assert!(hard.apply(255.0) < soft.apply(255.0));
    }

    #[test]
    fn processing_is_pure() {
        let raw = gradient();
        let contrast = Contrast::new(35.0);
        assert_eq!(contrast.process(&raw), contrast.process(&raw));
        assert_eq!(raw, gradient());
    }

    #[test]
    fn process_matches_apply() {
        let raw = gradient();
        let contrast = Contrast::with_base(-12.0, 1.04);
        let processed = contrast.process(&raw);
        for (raw, processed) in raw.pixels().iter().zip(processed.pixels()) {
            assert_eq!(contrast.apply(*raw), *processed);
        }
    }

    #[test]
    fn changing_contrast_does_not_compound() {
        let mut source = Source::new(gradient(), Contrast::new(10.0));
        let expected = Contrast::new(10.0).process(&gradient());
        source.set_contrast(Contrast::new(60.0));
        source.set_contrast(Contrast::new(-40.0));
        source.set_contrast(Contrast::new(10.0));
        assert_eq!(source.processed(), &expected);
        assert_eq!(source.raw(), &gradient());
    }
}
