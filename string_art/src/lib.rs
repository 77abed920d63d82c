pub mod geometry {
    pub mod point;
    pub mod segment;

    pub use point::Point;
    pub use segment::Segment;
}

mod algorithm;
pub mod config;
mod float;
pub mod grid;
pub mod history;
pub mod image;
pub mod pins;
pub mod session;
pub mod stroke;
pub mod verboser;

pub use algorithm::*;
pub use config::RunConfig;
pub use float::Float;
pub use grid::Grid;
pub use history::{reconstruct, Chord, History, Scene, StrokeStyle};
pub use crate::image::{Contrast, Luminance, PixelBuffer, Source};
pub use pins::PinTable;
pub use session::Session;
