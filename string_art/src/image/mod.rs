use crate::{geometry::Point, Float, Grid};
use ::image::{DynamicImage, GrayImage, Luma};
use num_traits::AsPrimitive;
use std::ops::Deref;

mod contrast;

pub use contrast::{Contrast, Source};

/// A row-major grid of samples.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer<T> {
    pixels: Vec<T>,
    grid: Grid,
}

impl<T> PixelBuffer<T> {
    /// Wraps `pixels`, returning `None` when their count does not match `grid`.
    pub fn from_raw(pixels: Vec<T>, grid: Grid) -> Option<Self> {
        (pixels.len() == grid.len()).then_some(Self { pixels, grid })
    }

    pub fn new(mut builder: impl FnMut(Point<usize>) -> T, grid: Grid) -> Self {
        let mut pixels = Vec::with_capacity(grid.len());
        for y in 0..grid.height {
            for x in 0..grid.width {
                pixels.push(builder(Point { x, y }));
            }
        }
        Self { pixels, grid }
    }

    pub fn filled(value: T, grid: Grid) -> Self
    where
        T: Clone,
    {
        Self {
            pixels: vec![value; grid.len()],
            grid,
        }
    }

    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.pixels
    }

    pub fn get(&self, point: Point<usize>) -> Option<&T> {
        self.grid
            .index_of(point)
            .and_then(|index| self.pixels.get(index))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> PixelBuffer<U> {
        PixelBuffer {
            pixels: self.pixels.iter().map(f).collect(),
            grid: self.grid,
        }
    }
}

impl<T> Deref for PixelBuffer<T> {
    type Target = Grid;

    fn deref(&self) -> &Self::Target {
        &self.grid
    }
}

/// Single channel luminance samples in the `0..=255` domain.
pub type Luminance<S> = PixelBuffer<S>;

impl<S: Float> Luminance<S> {
    /// Zeroes every sample whose pixel center lies outside the circle.
    pub fn mask_circle(&mut self, center: Point<S>, radius: S)
    where
        usize: AsPrimitive<S>,
    {
        let sq_radius = radius * radius;
        let width = self.grid.width;
        for (index, sample) in self.pixels.iter_mut().enumerate() {
            let pixel = Point {
                x: (index % width).as_() + S::HALF,
                y: (index / width).as_() + S::HALF,
            };
            if pixel.sq_distance(&center) > sq_radius {
                *sample = S::ZERO;
            }
        }
    }

    /// Zeroes every sample outside the circle inscribed in the grid.
    pub fn mask_inscribed_circle(&mut self)
    where
        usize: AsPrimitive<S>,
    {
        let grid = self.grid;
        let center = Point::from(grid).as_::<S>() * S::HALF;
        let radius = num_traits::Float::min(center.x, center.y);
        self.mask_circle(center, radius);
    }

    /// Averages the red, green and blue channels of every pixel.
    pub fn from_rgb_average(image: &DynamicImage) -> Self
    where
        u8: AsPrimitive<S>,
    {
        let rgb = image.to_rgb8();
        let three = S::ONE + S::TWO;
        Self {
            pixels: rgb
                .pixels()
                .map(|pixel| {
                    let [r, g, b]: [S; 3] = pixel.0.map(|channel| channel.as_());
                    (r + g + b) / three
                })
                .collect(),
            grid: Grid {
                height: image.height() as usize,
                width: image.width() as usize,
            },
        }
    }

    /// Samples are clamped to `0..=255` and rounded.
    pub fn to_luma8(&self) -> GrayImage {
        let width = self.grid.width as u32;
        let height = self.grid.height as u32;
        GrayImage::from_fn(width, height, |x, y| {
            let sample = self.pixels[y as usize * self.grid.width + x as usize];
            Luma([num_traits::cast(sample.max(S::ZERO).min(S::TWO_FIVE_FIVE).round())
                .unwrap_or(0u8)])
        })
    }
}
